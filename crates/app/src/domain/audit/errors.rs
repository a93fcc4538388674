//! Audit service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::tenancy::RouterError;

/// Audit service error variants.
#[derive(Debug, Error)]
pub enum AuditServiceError {
    /// The tenant database could not be reached.
    #[error("tenant database unavailable")]
    Router(#[from] RouterError),

    /// The tenant is not the one the target database was provisioned for.
    #[error("tenant is not provisioned in this database")]
    UnknownTenant,

    /// Provided data failed validation.
    #[error("invalid audit data")]
    InvalidData,

    /// The change set could not be serialized for hashing.
    #[error("failed to encode audit changes")]
    Encode(#[from] serde_json::Error),

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AuditServiceError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::UnknownTenant,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
