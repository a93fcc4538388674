//! Application configuration

use clap::Args;
use thiserror::Error;

pub mod db;
pub mod observability;
pub mod provisioning;

pub use db::DatabaseConfig;
pub use observability::{LogFormat, LoggingConfig};
pub use provisioning::{AppEnvironment, MigratorKind, ProvisioningConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `MASTER_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("MASTER_DATABASE_URL or DATABASE_URL must be set")]
    MissingRegistryUrl,

    /// Provisioning was requested without administrative credentials.
    #[error("ADMIN_DATABASE_URL must be set to provision tenant databases")]
    MissingAdminUrl,

    /// The `command` migrator was selected without a command.
    #[error("SCHEMA_MIGRATOR_COMMAND must be set when SCHEMA_MIGRATOR=command")]
    MissingMigratorCommand,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Tenant provisioning settings.
    #[command(flatten)]
    pub provisioning: ProvisioningConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
