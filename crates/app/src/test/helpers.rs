//! Test Helpers

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::domain::tenants::{
    data::{DEFAULT_SUBSCRIPTION_PLAN, DEFAULT_VAT_RATE_PERCENT},
    records::{SubscriptionStatus, TenantQuotas, TenantRecord, TenantUsage, TenantUuid},
};

/// An active, unblocked tenant on default quotas with no usage.
pub(crate) fn tenant_record() -> TenantRecord {
    let now = Timestamp::now();

    TenantRecord {
        uuid: TenantUuid::new(),
        name: "Acme".to_string(),
        tax_id: None,
        registration_number: None,
        email: None,
        subscription_status: SubscriptionStatus::Active,
        subscription_plan: DEFAULT_SUBSCRIPTION_PLAN.to_string(),
        subscription_end_date: None,
        is_active: true,
        block: None,
        quotas: TenantQuotas::default(),
        usage: TenantUsage {
            current_users_count: 0,
            current_vehicles_count: 0,
            orders_this_month: 0,
            last_reset_date: now,
        },
        default_vat_rate: Decimal::from(DEFAULT_VAT_RATE_PERCENT),
        created_at: now,
        updated_at: now,
    }
}
