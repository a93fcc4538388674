//! Access Decisions

use std::fmt;

use crate::domain::{
    access::errors::AccessDenied,
    tenants::records::{SubscriptionStatus, TenantRecord},
};

/// Message used when a blocked tenant has no stored reason.
pub const DEFAULT_BLOCKED_REASON: &str = "Tenant is blocked";

/// Why a tenant may not be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    TenantRequired,
    TenantNotFound,

    /// Carries the stored block reason, if any.
    Blocked(Option<String>),
    Inactive,
    SubscriptionNotActive(SubscriptionStatus),
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TenantRequired => f.write_str("Tenant ID is required"),
            Self::TenantNotFound => f.write_str("Tenant not found"),
            Self::Blocked(reason) => f.write_str(
                reason
                    .as_deref()
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or(DEFAULT_BLOCKED_REASON),
            ),
            Self::Inactive => f.write_str("Tenant is inactive"),
            Self::SubscriptionNotActive(status) => {
                write!(f, "Subscription is not active (status: {status})")
            }
        }
    }
}

/// Point-in-time access decision. Never cache across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenialReason),
}

impl AccessDecision {
    /// Evaluate a registry snapshot. Checks run in a fixed precedence: missing
    /// record, blocked, inactive, then subscription status.
    #[must_use]
    pub fn evaluate(tenant: Option<&TenantRecord>) -> Self {
        let Some(tenant) = tenant else {
            return Self::Denied(DenialReason::TenantNotFound);
        };

        if let Some(block) = &tenant.block {
            return Self::Denied(DenialReason::Blocked(block.reason.clone()));
        }

        if !tenant.is_active {
            return Self::Denied(DenialReason::Inactive);
        }

        if tenant.subscription_status != SubscriptionStatus::Active {
            return Self::Denied(DenialReason::SubscriptionNotActive(
                tenant.subscription_status,
            ));
        }

        Self::Allowed
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Human-readable denial reason.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Allowed => None,
            Self::Denied(reason) => Some(reason.to_string()),
        }
    }

    /// Convert a denial into an [`AccessDenied`] error.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] when access was denied.
    pub fn into_result(self) -> Result<(), AccessDenied> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(reason) => Err(AccessDenied(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{domain::tenants::records::TenantBlock, test::helpers::tenant_record};

    use jiff::Timestamp;

    use super::*;

    fn blocked(reason: Option<&str>) -> TenantBlock {
        TenantBlock {
            reason: reason.map(str::to_string),
            blocked_at: Timestamp::now(),
            blocked_by: None,
        }
    }

    #[test]
    fn missing_record_is_denied_as_not_found() {
        let decision = AccessDecision::evaluate(None);

        assert_eq!(decision.reason().as_deref(), Some("Tenant not found"));
    }

    #[test]
    fn blocked_tenant_is_denied_with_stored_reason() {
        let mut tenant = tenant_record();
        tenant.block = Some(blocked(Some("No pay")));

        let decision = AccessDecision::evaluate(Some(&tenant));

        assert!(!decision.is_allowed());
        assert_eq!(decision.reason().as_deref(), Some("No pay"));
    }

    #[test]
    fn blocked_tenant_without_reason_gets_generic_message() {
        let mut tenant = tenant_record();
        tenant.block = Some(blocked(None));

        assert_eq!(
            AccessDecision::evaluate(Some(&tenant)).reason().as_deref(),
            Some(DEFAULT_BLOCKED_REASON)
        );

        tenant.block = Some(blocked(Some("  ")));

        assert_eq!(
            AccessDecision::evaluate(Some(&tenant)).reason().as_deref(),
            Some(DEFAULT_BLOCKED_REASON)
        );
    }

    #[test]
    fn block_takes_precedence_over_inactive_and_subscription() {
        let mut tenant = tenant_record();
        tenant.block = Some(blocked(Some("Fraud")));
        tenant.is_active = false;
        tenant.subscription_status = SubscriptionStatus::Expired;

        assert_eq!(
            AccessDecision::evaluate(Some(&tenant)),
            AccessDecision::Denied(DenialReason::Blocked(Some("Fraud".to_string())))
        );
    }

    #[test]
    fn inactive_tenant_is_denied() {
        let mut tenant = tenant_record();
        tenant.is_active = false;
        tenant.subscription_status = SubscriptionStatus::Suspended;

        assert_eq!(
            AccessDecision::evaluate(Some(&tenant)).reason().as_deref(),
            Some("Tenant is inactive")
        );
    }

    #[test]
    fn suspended_subscription_is_denied() {
        let mut tenant = tenant_record();
        tenant.subscription_status = SubscriptionStatus::Suspended;

        let reason = AccessDecision::evaluate(Some(&tenant))
            .reason()
            .unwrap_or_default();

        assert!(reason.contains("Subscription"), "reason was {reason:?}");
        assert!(reason.contains("SUSPENDED"), "reason was {reason:?}");
    }

    #[test]
    fn active_tenant_is_allowed() {
        let decision = AccessDecision::evaluate(Some(&tenant_record()));

        assert!(decision.is_allowed());
        assert!(decision.reason().is_none());
        assert!(decision.into_result().is_ok());
    }

    #[test]
    fn denial_converts_into_error_with_reason() {
        let error = AccessDecision::Denied(DenialReason::Inactive)
            .into_result()
            .err();

        assert_eq!(error, Some(AccessDenied(DenialReason::Inactive)));
    }
}
