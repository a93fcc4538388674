use clap::Args;
use fleetdesk_app::{
    context::AppContext,
    domain::tenants::{data::NewTenant, records::TenantUuid},
};
use uuid::Uuid;

use crate::cli::error_chain;

#[derive(Debug, Args)]
pub(crate) struct CreateTenantArgs {
    /// Tenant display name
    #[arg(long)]
    name: String,

    /// Optional tenant UUID; generated when omitted
    #[arg(long)]
    tenant_uuid: Option<Uuid>,

    /// Contact email
    #[arg(long)]
    email: Option<String>,

    /// Tax identification number
    #[arg(long)]
    tax_id: Option<String>,

    /// Subscription plan
    #[arg(long)]
    plan: Option<String>,
}

pub(crate) async fn run(args: CreateTenantArgs, ctx: &AppContext) -> Result<(), String> {
    let uuid = args
        .tenant_uuid
        .map_or_else(TenantUuid::new, TenantUuid::from_uuid);

    let mut tenant = NewTenant::named(uuid, args.name);

    tenant.email = args.email;
    tenant.tax_id = args.tax_id;

    if let Some(plan) = args.plan {
        tenant.subscription_plan = plan;
    }

    let registration = ctx
        .provisioning
        .register_tenant(tenant)
        .await
        .map_err(|error| format!("failed to create tenant: {}", error_chain(&error)))?;

    println!("tenant_uuid: {}", registration.tenant.uuid);
    println!("tenant_name: {}", registration.tenant.name);

    match registration.provisioning {
        Some(report) => println!("database: {} ({:?})", report.database_name, report.creation),
        None => println!("database: not provisioned; run `tenant provision`"),
    }

    Ok(())
}
