//! Provisioning Reports

use crate::domain::tenants::records::{TenantRecord, TenantUuid};

/// Result of the database creation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseCreation {
    Created,
    AlreadyExisted,
}

/// Summary of a completed provisioning run. Every step ran successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningReport {
    pub tenant: TenantUuid,
    pub database_name: String,
    pub creation: DatabaseCreation,
}

/// A registry tenant together with its automatic provisioning result.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRegistration {
    pub tenant: TenantRecord,

    /// `None` when the gate left provisioning to an explicit operational step.
    pub provisioning: Option<ProvisioningReport>,
}
