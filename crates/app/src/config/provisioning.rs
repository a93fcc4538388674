//! Provisioning Config

use clap::Args;

use crate::domain::provisioning::ProvisioningGate;

/// Deployment environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AppEnvironment {
    Development,
    Test,
    Staging,
    Production,
}

/// Schema migration backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum MigratorKind {
    /// Migrations compiled into the binary.
    Embedded,

    /// External command receiving the target as `DATABASE_URL`.
    Command,
}

/// Tenant provisioning settings.
#[derive(Debug, Clone, Args)]
pub struct ProvisioningConfig {
    /// Administrative `PostgreSQL` connection string used to create databases
    #[arg(long, env = "ADMIN_DATABASE_URL", hide_env_values = true)]
    pub admin_database_url: Option<String>,

    /// Provision tenant databases automatically on creation
    #[arg(long, env = "TENANT_PROVISIONING_ENABLED", default_value_t = false)]
    pub tenant_provisioning_enabled: bool,

    /// Deployment environment
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = AppEnvironment::Development)]
    pub app_env: AppEnvironment,

    /// Schema migration backend
    #[arg(long, env = "SCHEMA_MIGRATOR", value_enum, default_value_t = MigratorKind::Embedded)]
    pub schema_migrator: MigratorKind,

    /// Migration command line for the `command` backend. Quote words that
    /// contain spaces.
    #[arg(long, env = "SCHEMA_MIGRATOR_COMMAND")]
    pub schema_migrator_command: Option<String>,
}

impl ProvisioningConfig {
    #[must_use]
    pub fn gate(&self) -> ProvisioningGate {
        ProvisioningGate {
            enabled: self.tenant_provisioning_enabled,
            environment: self.app_env,
        }
    }
}
