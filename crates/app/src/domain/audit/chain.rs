//! Audit hash chain.
//!
//! Each record hashes the previous record's hash together with its own
//! canonical JSON metadata and its stored changes text, so editing, removing or
//! reordering a committed record breaks every later link. The changes are
//! hashed as the exact text kept in the database, never re-serialized.

use jiff::Timestamp;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::domain::{
    audit::records::{AuditAction, AuditChangeRecord, AuditChangeUuid, AuditEntityType},
    tenants::records::TenantUuid,
};

/// Hashed content of an audit record.
#[derive(Debug, Clone, Copy)]
pub struct ChainContent<'a> {
    pub uuid: AuditChangeUuid,
    pub tenant_uuid: TenantUuid,
    pub entity_type: AuditEntityType,
    pub entity_id: &'a str,
    pub action: AuditAction,
    /// Serialized changes exactly as stored.
    pub changes_json: &'a str,
    pub user_id: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub created_at: Timestamp,
}

impl<'a> From<&'a AuditChangeRecord> for ChainContent<'a> {
    fn from(record: &'a AuditChangeRecord) -> Self {
        Self {
            uuid: record.uuid,
            tenant_uuid: record.tenant_uuid,
            entity_type: record.entity_type,
            entity_id: &record.entity_id,
            action: record.action,
            changes_json: &record.changes_json,
            user_id: record.user_id.as_deref(),
            ip_address: record.ip_address.as_deref(),
            user_agent: record.user_agent.as_deref(),
            created_at: record.created_at,
        }
    }
}

/// Canonical JSON of everything but the changes, with lexicographically
/// ordered keys.
fn canonical_metadata(content: &ChainContent<'_>) -> Result<Vec<u8>, serde_json::Error> {
    let value: Value = json!({
        "uuid": content.uuid.to_string(),
        "tenant_uuid": content.tenant_uuid.to_string(),
        "entity_type": content.entity_type.as_str(),
        "entity_id": content.entity_id,
        "action": content.action.as_str(),
        "user_id": content.user_id,
        "ip_address": content.ip_address,
        "user_agent": content.user_agent,
        "created_at": content.created_at.to_string(),
    });

    serde_json::to_vec(&value)
}

/// Hex SHA-256 of the previous hash, the record's canonical metadata and its
/// stored changes text, in that order.
///
/// # Errors
///
/// Returns an error when the metadata cannot be serialized.
pub fn record_hash(
    previous_hash: Option<&str>,
    content: &ChainContent<'_>,
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();

    hasher.update(previous_hash.unwrap_or_default().as_bytes());
    hasher.update(canonical_metadata(content)?);
    hasher.update(content.changes_json.as_bytes());

    Ok(format!("{:x}", hasher.finalize()))
}

/// How a chain link failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkBreak {
    /// The stored previous hash is not the preceding record's hash.
    PreviousHashMismatch,

    /// The stored hash does not match the record's content.
    RecordHashMismatch,
}

/// First record at which verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenLink {
    pub uuid: AuditChangeUuid,
    pub sequence: i64,
    pub kind: LinkBreak,
}

/// Outcome of re-walking an audit chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainVerification {
    /// Records checked before stopping.
    pub checked: usize,
    pub first_broken: Option<BrokenLink>,
}

impl ChainVerification {
    #[must_use]
    pub fn is_intact(&self) -> bool {
        self.first_broken.is_none()
    }
}

/// Verify records given in chain order.
///
/// # Errors
///
/// Returns an error when a record's metadata cannot be serialized.
pub fn verify(records: &[AuditChangeRecord]) -> Result<ChainVerification, serde_json::Error> {
    let mut previous: Option<&str> = None;

    for (index, record) in records.iter().enumerate() {
        let kind = if record.previous_hash.as_deref() != previous {
            Some(LinkBreak::PreviousHashMismatch)
        } else if record_hash(previous, &ChainContent::from(record))? != record.record_hash {
            Some(LinkBreak::RecordHashMismatch)
        } else {
            None
        };

        if let Some(kind) = kind {
            return Ok(ChainVerification {
                checked: index + 1,
                first_broken: Some(BrokenLink {
                    uuid: record.uuid,
                    sequence: record.sequence,
                    kind,
                }),
            });
        }

        previous = Some(record.record_hash.as_str());
    }

    Ok(ChainVerification {
        checked: records.len(),
        first_broken: None,
    })
}
