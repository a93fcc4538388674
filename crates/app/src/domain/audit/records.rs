//! Audit Records

use std::{collections::BTreeMap, fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{domain::tenants::records::TenantUuid, uuids::TypedUuid};

/// Audit Change UUID
pub type AuditChangeUuid = TypedUuid<AuditChangeRecord>;

/// Audited entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditEntityType {
    Vehicle,
    Customer,
    TachographEquipment,
    Document,
    Contact,
    BankAccount,
    Order,
    Invoice,
}

impl AuditEntityType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Customer => "customer",
            Self::TachographEquipment => "tachograph-equipment",
            Self::Document => "document",
            Self::Contact => "contact",
            Self::BankAccount => "bank-account",
            Self::Order => "order",
            Self::Invoice => "invoice",
        }
    }
}

impl fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown audit entity type `{0}`")]
pub struct UnknownAuditEntityType(pub String);

impl FromStr for AuditEntityType {
    type Err = UnknownAuditEntityType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "vehicle" => Ok(Self::Vehicle),
            "customer" => Ok(Self::Customer),
            "tachograph-equipment" => Ok(Self::TachographEquipment),
            "document" => Ok(Self::Document),
            "contact" => Ok(Self::Contact),
            "bank-account" => Ok(Self::BankAccount),
            "order" => Ok(Self::Order),
            "invoice" => Ok(Self::Invoice),
            other => Err(UnknownAuditEntityType(other.to_string())),
        }
    }
}

/// Mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown audit action `{0}`")]
pub struct UnknownAuditAction(pub String);

impl FromStr for AuditAction {
    type Err = UnknownAuditAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(UnknownAuditAction(other.to_string())),
        }
    }
}

/// Before and after values of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Field name to change, ordered by field name.
pub type AuditChanges = BTreeMap<String, FieldChange>;

/// Audit Change Record
#[derive(Debug, Clone, PartialEq)]
pub struct AuditChangeRecord {
    pub uuid: AuditChangeUuid,

    /// Position in the tenant database's audit chain.
    pub sequence: i64,

    pub tenant_uuid: TenantUuid,
    pub entity_type: AuditEntityType,
    pub entity_id: String,
    pub action: AuditAction,
    pub changes: AuditChanges,

    /// `changes` as stored, byte for byte. The record hash covers this text.
    pub changes_json: String,

    /// Acting user, when known.
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,

    /// Hash of the preceding record, `None` for the first record.
    pub previous_hash: Option<String>,

    /// Hash over `previous_hash` and this record's content.
    pub record_hash: String,
}
