//! Access errors.

use thiserror::Error;

use crate::domain::{
    access::{decision::DenialReason, limits::ResourceKind},
    tenants::TenantsServiceError,
};

/// Access was denied for the given reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AccessDenied(pub DenialReason);

/// A quota check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitError {
    /// No registry record for the tenant.
    #[error("Tenant not found")]
    TenantNotFound,

    /// The tenant is at or over quota for the resource.
    #[error("{} ({current}/{max})", .resource.limit_reached_message())]
    LimitReached {
        resource: ResourceKind,
        current: u32,
        max: u32,
    },
}

/// Access service failures. Policy outcomes are decisions, never errors.
#[derive(Debug, Error)]
pub enum AccessServiceError {
    /// The registry could not be read.
    #[error("failed to read tenant registry")]
    Registry(#[from] TenantsServiceError),
}
