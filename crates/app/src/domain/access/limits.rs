//! Resource Limits

use std::{fmt, str::FromStr};

use jiff::{Timestamp, tz::TimeZone};
use thiserror::Error;

use crate::domain::{
    access::errors::LimitError,
    tenants::records::{TenantRecord, TenantUsage},
};

/// Quota-governed resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Vehicles,

    /// Orders within the current calendar month.
    Orders,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Vehicles => "vehicles",
            Self::Orders => "orders",
        }
    }

    /// Denial message for a reached limit.
    #[must_use]
    pub const fn limit_reached_message(self) -> &'static str {
        match self {
            Self::Users => "User limit reached",
            Self::Vehicles => "Vehicle limit reached",
            Self::Orders => "Monthly order limit reached",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown resource kind `{0}`")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "users" => Ok(Self::Users),
            "vehicles" => Ok(Self::Vehicles),
            "orders" => Ok(Self::Orders),
            other => Err(UnknownResourceKind(other.to_string())),
        }
    }
}

/// Why a resource may not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDenial {
    TenantNotFound,
    LimitReached,
}

/// Advisory quota check. Callers must not treat it as an atomic reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitDecision {
    pub resource: ResourceKind,
    pub current: u32,
    pub max: u32,
    pub denial: Option<LimitDenial>,
}

impl LimitDecision {
    /// Evaluate a registry snapshot for one more `resource` at `now`.
    #[must_use]
    pub fn evaluate(tenant: Option<&TenantRecord>, resource: ResourceKind, now: Timestamp) -> Self {
        let Some(tenant) = tenant else {
            return Self {
                resource,
                current: 0,
                max: 0,
                denial: Some(LimitDenial::TenantNotFound),
            };
        };

        let (current, max) = match resource {
            ResourceKind::Users => (tenant.usage.current_users_count, tenant.quotas.max_users),
            ResourceKind::Vehicles => (
                tenant.usage.current_vehicles_count,
                tenant.quotas.max_vehicles,
            ),
            ResourceKind::Orders => (
                effective_orders_this_month(&tenant.usage, now),
                tenant.quotas.max_orders_per_month,
            ),
        };

        Self {
            resource,
            current,
            max,
            denial: (current >= max).then_some(LimitDenial::LimitReached),
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.denial.is_none()
    }

    /// Human-readable denial reason.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        self.denial.map(|denial| match denial {
            LimitDenial::TenantNotFound => "Tenant not found",
            LimitDenial::LimitReached => self.resource.limit_reached_message(),
        })
    }

    /// Convert a denial into a [`LimitError`].
    ///
    /// # Errors
    ///
    /// Returns [`LimitError`] when the limit check failed.
    pub fn into_result(self) -> Result<(), LimitError> {
        match self.denial {
            None => Ok(()),
            Some(LimitDenial::TenantNotFound) => Err(LimitError::TenantNotFound),
            Some(LimitDenial::LimitReached) => Err(LimitError::LimitReached {
                resource: self.resource,
                current: self.current,
                max: self.max,
            }),
        }
    }
}

/// Orders counted against this month's quota. A counter last reset in an
/// earlier UTC month is stale and counts as zero.
#[must_use]
pub fn effective_orders_this_month(usage: &TenantUsage, now: Timestamp) -> u32 {
    let last_reset = usage.last_reset_date.to_zoned(TimeZone::UTC);
    let now = now.to_zoned(TimeZone::UTC);

    if (last_reset.year(), last_reset.month()) < (now.year(), now.month()) {
        0
    } else {
        usage.orders_this_month
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::helpers::tenant_record;

    use super::*;

    fn at(timestamp: &str) -> Result<Timestamp, jiff::Error> {
        timestamp.parse()
    }

    #[test]
    fn missing_record_is_denied_with_zero_counts() {
        let decision = LimitDecision::evaluate(None, ResourceKind::Users, Timestamp::now());

        assert!(!decision.is_allowed());
        assert_eq!(decision.reason(), Some("Tenant not found"));
        assert_eq!((decision.current, decision.max), (0, 0));
    }

    #[test]
    fn users_at_quota_are_denied() {
        let mut tenant = tenant_record();
        tenant.usage.current_users_count = 5;
        tenant.quotas.max_users = 5;

        let decision = LimitDecision::evaluate(Some(&tenant), ResourceKind::Users, Timestamp::now());

        assert_eq!(decision.reason(), Some("User limit reached"));
        assert_eq!((decision.current, decision.max), (5, 5));
    }

    #[test]
    fn users_below_quota_are_allowed() {
        let mut tenant = tenant_record();
        tenant.usage.current_users_count = 4;
        tenant.quotas.max_users = 5;

        let decision = LimitDecision::evaluate(Some(&tenant), ResourceKind::Users, Timestamp::now());

        assert!(decision.is_allowed());
        assert_eq!(decision.reason(), None);
        assert_eq!((decision.current, decision.max), (4, 5));
    }

    #[test]
    fn vehicles_over_quota_are_denied() {
        let mut tenant = tenant_record();
        tenant.usage.current_vehicles_count = 12;
        tenant.quotas.max_vehicles = 10;

        let decision =
            LimitDecision::evaluate(Some(&tenant), ResourceKind::Vehicles, Timestamp::now());

        assert_eq!(decision.reason(), Some("Vehicle limit reached"));
    }

    #[test]
    fn orders_from_previous_month_count_as_zero() -> TestResult {
        let mut tenant = tenant_record();
        tenant.usage.orders_this_month = 100;
        tenant.usage.last_reset_date = at("2026-01-15T10:00:00Z")?;
        tenant.quotas.max_orders_per_month = 100;

        let decision =
            LimitDecision::evaluate(Some(&tenant), ResourceKind::Orders, at("2026-02-01T00:00:00Z")?);

        assert!(decision.is_allowed());
        assert_eq!(decision.current, 0);

        Ok(())
    }

    #[test]
    fn orders_from_previous_year_count_as_zero() -> TestResult {
        let mut tenant = tenant_record();
        tenant.usage.orders_this_month = 100;
        tenant.usage.last_reset_date = at("2025-12-31T23:59:59Z")?;

        let decision =
            LimitDecision::evaluate(Some(&tenant), ResourceKind::Orders, at("2026-01-01T00:00:00Z")?);

        assert_eq!(decision.current, 0);

        Ok(())
    }

    #[test]
    fn orders_in_current_month_count_against_quota() -> TestResult {
        let mut tenant = tenant_record();
        tenant.usage.orders_this_month = 100;
        tenant.usage.last_reset_date = at("2026-03-01T00:00:00Z")?;
        tenant.quotas.max_orders_per_month = 100;

        let decision =
            LimitDecision::evaluate(Some(&tenant), ResourceKind::Orders, at("2026-03-31T12:00:00Z")?);

        assert_eq!(decision.reason(), Some("Monthly order limit reached"));
        assert_eq!((decision.current, decision.max), (100, 100));

        Ok(())
    }

    #[test]
    fn limit_reached_converts_into_error_with_counts() {
        let decision = LimitDecision {
            resource: ResourceKind::Users,
            current: 5,
            max: 5,
            denial: Some(LimitDenial::LimitReached),
        };

        let Err(error) = decision.into_result() else {
            panic!("expected limit error");
        };

        assert_eq!(error.to_string(), "User limit reached (5/5)");
    }

    #[test]
    fn resource_kind_parses_round_trip() -> TestResult {
        for kind in [ResourceKind::Users, ResourceKind::Vehicles, ResourceKind::Orders] {
            assert_eq!(kind.as_str().parse::<ResourceKind>()?, kind);
        }

        assert!("trucks".parse::<ResourceKind>().is_err());

        Ok(())
    }
}
