//! Provisioning errors.

use thiserror::Error;

use crate::{config::ConfigError, domain::tenants::TenantsServiceError, tenancy::RouterError};

/// Schema migration failures.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The target database could not be reached.
    #[error("failed to connect to migration target")]
    Connect(#[source] sqlx::Error),

    /// An embedded migration failed.
    #[error("embedded migration failed")]
    Embedded(#[from] sqlx::migrate::MigrateError),

    /// The migration command is empty.
    #[error("migration command is empty")]
    EmptyCommand,

    /// The migration command leaves a quote open.
    #[error("migration command has an unterminated {quote} quote")]
    UnterminatedQuote { quote: char },

    /// The migration command could not be started.
    #[error("failed to start migration command `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The migration command exited unsuccessfully.
    #[error("migration command failed ({status}): {diagnostics}")]
    CommandFailed { status: String, diagnostics: String },
}

/// Provisioning failures. The registry row is never rolled back.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Required configuration is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tenant has no registry record.
    #[error("tenant not found in registry")]
    TenantNotFound,

    /// The registry could not be read or written.
    #[error("registry operation failed")]
    Registry(#[from] TenantsServiceError),

    /// The administrative connection failed.
    #[error("failed to connect with administrative credentials")]
    AdminConnect(#[source] sqlx::Error),

    /// `CREATE DATABASE` failed for a reason other than the database existing.
    #[error("failed to create database `{database}`")]
    CreateDatabase {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    /// Schema application failed.
    #[error("failed to apply schema to `{database}`")]
    Schema {
        database: String,
        #[source]
        source: MigrationError,
    },

    /// The tenant database could not be reached.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// The bootstrap row could not be written.
    #[error("failed to write bootstrap tenant row")]
    Bootstrap(#[source] sqlx::Error),
}
