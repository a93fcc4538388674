//! Audit trail

pub mod chain;
pub mod data;
pub mod diff;
pub mod errors;
pub mod records;
mod repository;
pub mod request;
pub mod service;

pub use data::NewAuditChange;
pub use diff::diff;
pub use errors::AuditServiceError;
pub use request::RequestContext;
pub use service::*;
