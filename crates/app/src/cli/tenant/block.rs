use clap::Args;
use fleetdesk_app::{
    context::AppContext,
    domain::tenants::{data::BlockTenant, records::TenantUuid},
};
use uuid::Uuid;

use crate::cli::error_chain;

#[derive(Debug, Args)]
pub(crate) struct BlockArgs {
    /// Tenant to block
    #[arg(long)]
    tenant_uuid: Uuid,

    /// Reason shown to the tenant's users
    #[arg(long)]
    reason: Option<String>,

    /// Operator performing the block
    #[arg(long)]
    blocked_by: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct UnblockArgs {
    /// Tenant to unblock
    #[arg(long)]
    tenant_uuid: Uuid,
}

pub(crate) async fn block(args: BlockArgs, ctx: &AppContext) -> Result<(), String> {
    let tenant = TenantUuid::from_uuid(args.tenant_uuid);

    ctx.tenants
        .block_tenant(
            tenant,
            BlockTenant {
                reason: args.reason,
                blocked_by: args.blocked_by,
            },
        )
        .await
        .map_err(|error| format!("failed to block tenant: {}", error_chain(&error)))?;

    sync_bootstrap(tenant, ctx).await;

    println!("blocked: {tenant}");

    Ok(())
}

pub(crate) async fn unblock(args: UnblockArgs, ctx: &AppContext) -> Result<(), String> {
    let tenant = TenantUuid::from_uuid(args.tenant_uuid);

    ctx.tenants
        .unblock_tenant(tenant)
        .await
        .map_err(|error| format!("failed to unblock tenant: {}", error_chain(&error)))?;

    sync_bootstrap(tenant, ctx).await;

    println!("unblocked: {tenant}");

    Ok(())
}

/// The registry is authoritative; a stale bootstrap row is repaired later.
async fn sync_bootstrap(tenant: TenantUuid, ctx: &AppContext) {
    if let Err(error) = ctx.provisioning.sync_bootstrap(tenant).await {
        tracing::warn!(
            tenant_uuid = %tenant,
            error = %error_chain(&error),
            "failed to mirror block state into tenant database"
        );
    }
}
