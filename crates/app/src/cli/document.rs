use clap::{Args, Subcommand};
use fleetdesk_app::{
    context::AppContext,
    domain::{numbering::DocumentType, tenants::records::TenantUuid},
};
use jiff::Timestamp;
use uuid::Uuid;

use crate::cli::error_chain;

#[derive(Debug, Args)]
pub(crate) struct DocumentCommand {
    #[command(subcommand)]
    command: DocumentSubcommand,
}

#[derive(Debug, Subcommand)]
enum DocumentSubcommand {
    /// Allocate the next document number
    NextNumber(NextNumberArgs),
}

#[derive(Debug, Args)]
struct NextNumberArgs {
    /// Owning tenant
    #[arg(long)]
    tenant_uuid: Uuid,

    /// Document type (ORDER, INVOICE, UPD)
    #[arg(long)]
    document_type: DocumentType,
}

pub(crate) async fn run(command: DocumentCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        DocumentSubcommand::NextNumber(args) => next_number(args, ctx).await,
    }
}

async fn next_number(args: NextNumberArgs, ctx: &AppContext) -> Result<(), String> {
    let tenant = TenantUuid::from_uuid(args.tenant_uuid);

    let handle = ctx
        .router
        .tenant_handle(tenant)
        .await
        .map_err(|error| error_chain(&error))?;

    let mut tx = handle
        .begin_transaction()
        .await
        .map_err(|error| format!("failed to start transaction: {error}"))?;

    let number = ctx
        .numbering
        .next_number(&mut tx, tenant, args.document_type, Timestamp::now())
        .await
        .map_err(|error| format!("failed to allocate number: {}", error_chain(&error)))?;

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit changes: {error}"))?;

    println!("{number}");

    Ok(())
}
