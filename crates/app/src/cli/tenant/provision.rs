use clap::Args;
use fleetdesk_app::{
    context::AppContext,
    domain::{provisioning::ProvisioningReport, tenants::records::TenantUuid},
};
use uuid::Uuid;

use crate::cli::error_chain;

#[derive(Debug, Args)]
pub(crate) struct ProvisionArgs {
    /// Tenant to provision
    #[arg(long)]
    tenant_uuid: Uuid,
}

#[derive(Debug, Args)]
pub(crate) struct RepairArgs {
    /// Tenant to repair
    #[arg(long, required_unless_present = "all", conflicts_with = "all")]
    tenant_uuid: Option<Uuid>,

    /// Repair every registry tenant
    #[arg(long)]
    all: bool,
}

pub(crate) async fn provision(args: ProvisionArgs, ctx: &AppContext) -> Result<(), String> {
    let report = ctx
        .provisioning
        .provision(TenantUuid::from_uuid(args.tenant_uuid))
        .await
        .map_err(|error| format!("failed to provision tenant: {}", error_chain(&error)))?;

    print_report(&report);

    Ok(())
}

pub(crate) async fn repair(args: RepairArgs, ctx: &AppContext) -> Result<(), String> {
    if let Some(tenant) = args.tenant_uuid {
        let report = ctx
            .provisioning
            .repair(TenantUuid::from_uuid(tenant))
            .await
            .map_err(|error| format!("failed to repair tenant: {}", error_chain(&error)))?;

        print_report(&report);

        return Ok(());
    }

    let outcomes = ctx
        .provisioning
        .repair_all()
        .await
        .map_err(|error| format!("failed to list tenants: {}", error_chain(&error)))?;

    let mut failed = 0_usize;

    for (tenant, outcome) in &outcomes {
        match outcome {
            Ok(report) => print_report(report),
            Err(error) => {
                failed += 1;
                println!("{tenant}: failed: {}", error_chain(error));
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} tenants failed to repair", outcomes.len()));
    }

    Ok(())
}

fn print_report(report: &ProvisioningReport) {
    println!(
        "{}: {} ({:?})",
        report.tenant, report.database_name, report.creation
    );
}
