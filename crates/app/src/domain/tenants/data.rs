//! Tenant Data

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::domain::tenants::records::{SubscriptionStatus, TenantQuotas, TenantUuid};

/// New Tenant Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
    /// UUID to assign to the tenant row.
    pub uuid: TenantUuid,

    /// Tenant name to persist.
    pub name: String,

    pub tax_id: Option<String>,
    pub registration_number: Option<String>,
    pub email: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: String,
    pub subscription_end_date: Option<Timestamp>,
    pub quotas: TenantQuotas,
    pub default_vat_rate: Decimal,
}

impl NewTenant {
    /// A tenant on the default plan with default quotas.
    #[must_use]
    pub fn named(uuid: TenantUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            tax_id: None,
            registration_number: None,
            email: None,
            subscription_status: SubscriptionStatus::Active,
            subscription_plan: DEFAULT_SUBSCRIPTION_PLAN.to_string(),
            subscription_end_date: None,
            quotas: TenantQuotas::default(),
            default_vat_rate: Decimal::from(DEFAULT_VAT_RATE_PERCENT),
        }
    }
}

/// Plan assigned when none is given.
pub const DEFAULT_SUBSCRIPTION_PLAN: &str = "basic";

/// VAT rate assigned when none is given.
pub const DEFAULT_VAT_RATE_PERCENT: u32 = 20;

/// Block request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTenant {
    pub reason: Option<String>,
    pub blocked_by: Option<String>,
}
