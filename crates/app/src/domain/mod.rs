//! Tenant data-plane domain concerns

pub mod access;
pub mod audit;
pub mod numbering;
pub mod provisioning;
pub mod tenants;
