use clap::{Parser, Subcommand};
use fleetdesk_app::{config::AppConfig, context::AppContext};

mod audit;
mod db;
mod document;
mod tenant;

#[derive(Debug, Parser)]
#[command(name = "fleetdesk-app", about = "Fleetdesk tenant data-plane CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Registry database maintenance
    Db(db::DbCommand),

    /// Tenant registry and provisioning
    Tenant(tenant::TenantCommand),

    /// Tenant audit trails
    Audit(audit::AuditCommand),

    /// Tenant document numbering
    Document(document::DocumentCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        // Registry migrations run before the services can be wired.
        let command = match self.command {
            Commands::Db(command) => return db::run(command, &self.config).await,
            command => command,
        };

        let ctx = AppContext::connect(&self.config)
            .await
            .map_err(|error| format!("failed to initialise: {}", error_chain(&error)))?;

        let result = match command {
            Commands::Db(_) => Ok(()),
            Commands::Tenant(command) => tenant::run(command, &ctx).await,
            Commands::Audit(command) => audit::run(command, &ctx).await,
            Commands::Document(command) => document::run(command, &ctx).await,
        };

        ctx.close().await;

        result
    }
}

/// Render an error with its sources, outermost first.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }

    rendered
}
