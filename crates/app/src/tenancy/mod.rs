//! Tenant database naming and connection routing.

pub mod naming;
pub mod router;

pub use naming::{DATABASE_NAMESPACE, DatabaseNaming, NamingError};
pub use router::{ConnectionRouter, PgPoolConnector, PoolConnector, RouterError, TenantHandle};
