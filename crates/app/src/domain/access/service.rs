//! Access service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::debug;

use crate::domain::{
    access::{
        decision::{AccessDecision, DenialReason},
        errors::AccessServiceError,
        limits::{LimitDecision, ResourceKind},
    },
    tenants::{TenantsService, records::TenantUuid},
};

/// Gate and quota checks over the registry.
#[derive(Clone)]
pub struct TenantAccessService {
    tenants: Arc<dyn TenantsService>,
}

impl std::fmt::Debug for TenantAccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantAccessService").finish_non_exhaustive()
    }
}

impl TenantAccessService {
    #[must_use]
    pub fn new(tenants: Arc<dyn TenantsService>) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl AccessService for TenantAccessService {
    #[tracing::instrument(
        name = "access.service.check_access",
        skip_all,
        fields(tenant_uuid = tenant.map(tracing::field::display)),
        err
    )]
    async fn check_access(
        &self,
        tenant: Option<TenantUuid>,
    ) -> Result<AccessDecision, AccessServiceError> {
        let Some(tenant) = tenant else {
            return Ok(AccessDecision::Denied(DenialReason::TenantRequired));
        };

        let record = self.tenants.find_tenant(tenant).await?;
        let decision = AccessDecision::evaluate(record.as_ref());

        if let Some(reason) = decision.reason() {
            debug!(%reason, "tenant access denied");
        }

        Ok(decision)
    }

    #[tracing::instrument(
        name = "access.service.check_limit",
        skip_all,
        fields(tenant_uuid = %tenant, resource = %resource),
        err
    )]
    async fn check_limit(
        &self,
        tenant: TenantUuid,
        resource: ResourceKind,
    ) -> Result<LimitDecision, AccessServiceError> {
        let record = self.tenants.find_tenant(tenant).await?;
        let decision = LimitDecision::evaluate(record.as_ref(), resource, Timestamp::now());

        if let Some(reason) = decision.reason() {
            debug!(
                reason,
                current = decision.current,
                max = decision.max,
                "tenant limit check failed"
            );
        }

        Ok(decision)
    }
}

#[automock]
#[async_trait]
/// Tenant gate and quota checks.
pub trait AccessService: Send + Sync {
    /// Decide whether a tenant may be served right now.
    ///
    /// Performs exactly one registry read when a tenant is given and none
    /// otherwise. Denials are `Ok` decisions; only storage failures are errors.
    async fn check_access(
        &self,
        tenant: Option<TenantUuid>,
    ) -> Result<AccessDecision, AccessServiceError>;

    /// Decide whether a tenant may create one more `resource`.
    ///
    /// Advisory only: concurrent creators can both pass at `current = max - 1`.
    async fn check_limit(
        &self,
        tenant: TenantUuid,
        resource: ResourceKind,
    ) -> Result<LimitDecision, AccessServiceError>;
}
