use clap::Args;
use fleetdesk_app::{
    context::AppContext,
    domain::{access::limits::ResourceKind, tenants::records::TenantUuid},
};
use uuid::Uuid;

use crate::cli::error_chain;

#[derive(Debug, Args)]
pub(crate) struct AccessArgs {
    /// Tenant to check
    #[arg(long)]
    tenant_uuid: Option<Uuid>,
}

#[derive(Debug, Args)]
pub(crate) struct LimitArgs {
    /// Tenant to check
    #[arg(long)]
    tenant_uuid: Uuid,

    /// Resource kind (users, vehicles, orders)
    #[arg(long)]
    resource: ResourceKind,
}

pub(crate) async fn access(args: AccessArgs, ctx: &AppContext) -> Result<(), String> {
    let decision = ctx
        .access
        .check_access(args.tenant_uuid.map(TenantUuid::from_uuid))
        .await
        .map_err(|error| format!("failed to check access: {}", error_chain(&error)))?;

    decision.into_result().map_err(|denied| denied.to_string())?;

    println!("allowed");

    Ok(())
}

pub(crate) async fn limit(args: LimitArgs, ctx: &AppContext) -> Result<(), String> {
    let decision = ctx
        .access
        .check_limit(TenantUuid::from_uuid(args.tenant_uuid), args.resource)
        .await
        .map_err(|error| format!("failed to check limit: {}", error_chain(&error)))?;

    println!("{}: {}/{}", decision.resource, decision.current, decision.max);

    decision.into_result().map_err(|error| error.to_string())
}
