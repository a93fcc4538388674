//! Tenant Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Tenant UUID
pub type TenantUuid = TypedUuid<TenantRecord>;

/// Subscription lifecycle states stored in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Active,
    Suspended,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown subscription status string.
#[derive(Debug, Error)]
#[error("unknown subscription status `{0}`")]
pub struct UnknownSubscriptionStatus(pub String);

impl FromStr for SubscriptionStatus {
    type Err = UnknownSubscriptionStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(UnknownSubscriptionStatus(other.to_string())),
        }
    }
}

/// Block metadata. Present exactly when the tenant is blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantBlock {
    /// Operator-supplied reason, surfaced verbatim by the access gate.
    pub reason: Option<String>,

    /// When the block was applied.
    pub blocked_at: Timestamp,

    /// Who applied the block.
    pub blocked_by: Option<String>,
}

/// Maximum allowed resource counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantQuotas {
    pub max_users: u32,
    pub max_vehicles: u32,
    pub max_orders_per_month: u32,
}

impl Default for TenantQuotas {
    fn default() -> Self {
        Self {
            max_users: 5,
            max_vehicles: 10,
            max_orders_per_month: 100,
        }
    }
}

/// Running usage counters maintained by resource-creation flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantUsage {
    pub current_users_count: u32,
    pub current_vehicles_count: u32,
    pub orders_this_month: u32,

    /// Start of the window `orders_this_month` counts within.
    pub last_reset_date: Timestamp,
}

/// Tenant Record
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRecord {
    /// Unique tenant identifier.
    pub uuid: TenantUuid,

    /// Human-readable tenant name.
    pub name: String,

    /// Primary tax identifier.
    pub tax_id: Option<String>,

    /// Company registration number.
    pub registration_number: Option<String>,

    /// Contact email.
    pub email: Option<String>,

    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: String,
    pub subscription_end_date: Option<Timestamp>,

    /// Soft lifecycle flag; tenants are never deleted.
    pub is_active: bool,

    /// Block metadata, `None` when the tenant is not blocked.
    pub block: Option<TenantBlock>,

    pub quotas: TenantQuotas,
    pub usage: TenantUsage,

    /// Default VAT rate in percent.
    pub default_vat_rate: Decimal,

    /// Tenant creation timestamp.
    pub created_at: Timestamp,

    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl TenantRecord {
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.block.is_some()
    }
}
