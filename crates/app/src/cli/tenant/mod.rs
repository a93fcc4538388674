use clap::{Args, Subcommand};
use fleetdesk_app::context::AppContext;

mod block;
mod check;
mod create;
mod provision;

#[derive(Debug, Args)]
pub(crate) struct TenantCommand {
    #[command(subcommand)]
    command: TenantSubcommand,
}

#[derive(Debug, Subcommand)]
enum TenantSubcommand {
    /// Register a tenant, provisioning its database when allowed
    Create(create::CreateTenantArgs),

    /// Create, migrate and bootstrap a tenant database
    Provision(provision::ProvisionArgs),

    /// Re-run provisioning for one tenant or every tenant
    Repair(provision::RepairArgs),

    /// Block a tenant
    Block(block::BlockArgs),

    /// Unblock a tenant
    Unblock(block::UnblockArgs),

    /// Check whether a tenant may access the system
    Access(check::AccessArgs),

    /// Check whether a tenant may create another resource
    Limit(check::LimitArgs),
}

pub(crate) async fn run(command: TenantCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        TenantSubcommand::Create(args) => create::run(args, ctx).await,
        TenantSubcommand::Provision(args) => provision::provision(args, ctx).await,
        TenantSubcommand::Repair(args) => provision::repair(args, ctx).await,
        TenantSubcommand::Block(args) => block::block(args, ctx).await,
        TenantSubcommand::Unblock(args) => block::unblock(args, ctx).await,
        TenantSubcommand::Access(args) => check::access(args, ctx).await,
        TenantSubcommand::Limit(args) => check::limit(args, ctx).await,
    }
}
