//! Access gate and resource limit guard.

pub mod decision;
pub mod errors;
pub mod limits;
pub mod service;

pub use decision::{AccessDecision, DenialReason};
pub use errors::{AccessDenied, AccessServiceError, LimitError};
pub use limits::{LimitDecision, ResourceKind};
pub use service::*;
