//! Tenant database provisioning

pub mod errors;
pub mod gate;
pub mod migrator;
pub mod report;
mod repository;
pub mod service;

pub use errors::{MigrationError, ProvisioningError};
pub use gate::ProvisioningGate;
pub use migrator::{CommandSchemaMigrator, EmbeddedSchemaMigrator, SchemaMigrator};
pub use report::{DatabaseCreation, ProvisioningReport, TenantRegistration};
pub use service::*;
