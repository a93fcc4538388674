//! Numbering errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Allocation failures. These abort the caller's transaction.
#[derive(Debug, Error)]
pub enum NumberingError {
    /// The tenant is not the one this database was provisioned for.
    #[error("tenant is not provisioned in this database")]
    UnknownTenant,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for NumberingError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::UnknownTenant,
            _ => Self::Sql(error),
        }
    }
}
