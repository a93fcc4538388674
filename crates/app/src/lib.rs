//! Multi-tenant data plane.
//!
//! A registry database holds one row per tenant; each tenant's business data
//! lives in its own `PostgreSQL` database. This crate derives tenant database
//! names, routes work to the right database, gates access on tenant state and
//! quotas, provisions tenant databases, records a tamper-evident audit trail
//! and allocates gap-free document numbers.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;
pub mod tenancy;
pub mod uuids;

#[cfg(test)]
mod test;
