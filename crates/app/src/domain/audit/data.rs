//! Audit Data

use crate::domain::{
    audit::{
        diff::AuditSnapshot,
        records::{AuditAction, AuditEntityType},
        request::RequestContext,
    },
    tenants::records::TenantUuid,
};

/// A mutation to audit. Snapshots are taken before and after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditChange {
    /// Tenant that owns the entity; selects the database written to.
    pub tenant: TenantUuid,

    pub entity_type: AuditEntityType,
    pub entity_id: String,
    pub action: AuditAction,

    /// Snapshot before the change, `None` for creations.
    pub old: Option<AuditSnapshot>,

    /// Snapshot after the change, `None` for deletions.
    pub new: Option<AuditSnapshot>,

    pub user_id: Option<String>,
    pub request: RequestContext,
}
