use clap::{Args, Subcommand};
use fleetdesk_app::{
    context::AppContext,
    domain::{audit::records::AuditEntityType, tenants::records::TenantUuid},
};
use uuid::Uuid;

use crate::cli::error_chain;

#[derive(Debug, Args)]
pub(crate) struct AuditCommand {
    #[command(subcommand)]
    command: AuditSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuditSubcommand {
    /// Re-walk a tenant's audit hash chain
    Verify(VerifyArgs),

    /// Show an entity's audit history, newest first
    History(HistoryArgs),
}

#[derive(Debug, Args)]
struct VerifyArgs {
    /// Tenant whose chain to verify
    #[arg(long)]
    tenant_uuid: Uuid,
}

#[derive(Debug, Args)]
struct HistoryArgs {
    /// Owning tenant
    #[arg(long)]
    tenant_uuid: Uuid,

    /// Entity type, e.g. `vehicle` or `bank-account`
    #[arg(long)]
    entity_type: AuditEntityType,

    /// Entity identifier
    #[arg(long)]
    entity_id: String,
}

pub(crate) async fn run(command: AuditCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        AuditSubcommand::Verify(args) => verify(args, ctx).await,
        AuditSubcommand::History(args) => history(args, ctx).await,
    }
}

async fn verify(args: VerifyArgs, ctx: &AppContext) -> Result<(), String> {
    let verification = ctx
        .audit
        .verify_chain(TenantUuid::from_uuid(args.tenant_uuid))
        .await
        .map_err(|error| format!("failed to verify audit chain: {}", error_chain(&error)))?;

    match verification.first_broken {
        None => {
            println!("audit chain intact ({} records)", verification.checked);

            Ok(())
        }
        Some(broken) => Err(format!(
            "audit chain broken at record {} (sequence {}): {:?}",
            broken.uuid, broken.sequence, broken.kind
        )),
    }
}

async fn history(args: HistoryArgs, ctx: &AppContext) -> Result<(), String> {
    let changes = ctx
        .audit
        .list_changes(
            TenantUuid::from_uuid(args.tenant_uuid),
            args.entity_type,
            &args.entity_id,
        )
        .await
        .map_err(|error| format!("failed to list audit changes: {}", error_chain(&error)))?;

    for change in changes {
        let fields = serde_json::to_string(&change.changes)
            .map_err(|error| format!("failed to render changes: {error}"))?;

        println!(
            "{} {} {} {}",
            change.created_at,
            change.action,
            change.user_id.as_deref().unwrap_or("-"),
            fields
        );
    }

    Ok(())
}
