//! Audit service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{debug, warn};

use crate::{
    domain::{
        audit::{
            chain::{self, ChainContent, ChainVerification},
            data::NewAuditChange,
            diff::diff,
            errors::AuditServiceError,
            records::{AuditAction, AuditChangeRecord, AuditChangeUuid, AuditEntityType},
            repository::{AuditChangeRow, PgAuditRepository},
        },
        tenants::records::TenantUuid,
    },
    tenancy::ConnectionRouter,
};

/// Result of auditing one mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Recorded(Box<AuditChangeRecord>),

    /// Updates that changed nothing are not recorded.
    SkippedEmptyUpdate,
}

/// Audit trail stored in each tenant's own database.
#[derive(Debug, Clone)]
pub struct PgAuditService {
    router: Arc<ConnectionRouter>,
    repository: PgAuditRepository,
}

impl PgAuditService {
    #[must_use]
    pub fn new(router: Arc<ConnectionRouter>) -> Self {
        Self {
            router,
            repository: PgAuditRepository::new(),
        }
    }
}

#[async_trait]
impl AuditService for PgAuditService {
    #[tracing::instrument(
        name = "audit.service.record_change",
        skip_all,
        fields(
            tenant_uuid = %change.tenant,
            entity_type = %change.entity_type,
            entity_id = %change.entity_id,
            action = %change.action,
        ),
        err
    )]
    async fn record_change(
        &self,
        change: NewAuditChange,
    ) -> Result<AuditOutcome, AuditServiceError> {
        let changes = diff(change.old.as_ref(), change.new.as_ref());

        if change.action == AuditAction::Update && changes.is_empty() {
            debug!("skipping audit of unchanged update");

            return Ok(AuditOutcome::SkippedEmptyUpdate);
        }

        let handle = self.router.tenant_handle(change.tenant).await?;
        let mut tx = handle.begin_transaction().await?;

        self.repository.lock_chain(&mut tx).await?;

        let previous_hash = self.repository.latest_record_hash(&mut tx).await?;

        // Stored timestamps have microsecond precision; hash what will be read back.
        let now = Timestamp::now();
        let created_at = Timestamp::from_microsecond(now.as_microsecond()).unwrap_or(now);

        // Hash the exact text that is stored.
        let changes_json = serde_json::to_string(&changes)?;

        let content = ChainContent {
            uuid: AuditChangeUuid::new(),
            tenant_uuid: change.tenant,
            entity_type: change.entity_type,
            entity_id: &change.entity_id,
            action: change.action,
            changes_json: &changes_json,
            user_id: change.user_id.as_deref(),
            ip_address: change.request.ip_address.as_deref(),
            user_agent: change.request.user_agent.as_deref(),
            created_at,
        };

        let record_hash = chain::record_hash(previous_hash.as_deref(), &content)?;

        let record = self
            .repository
            .create_audit_change(
                &mut tx,
                AuditChangeRow {
                    uuid: content.uuid,
                    tenant_uuid: content.tenant_uuid,
                    entity_type: content.entity_type,
                    entity_id: content.entity_id,
                    action: content.action,
                    changes_json: content.changes_json,
                    user_id: content.user_id,
                    ip_address: content.ip_address,
                    user_agent: content.user_agent,
                    created_at: content.created_at,
                    previous_hash: previous_hash.as_deref(),
                    record_hash: &record_hash,
                },
            )
            .await?;

        tx.commit().await?;

        Ok(AuditOutcome::Recorded(Box::new(record)))
    }

    async fn log_change(
        &self,
        change: NewAuditChange,
    ) -> Result<AuditOutcome, AuditServiceError> {
        let tenant = change.tenant;
        let entity_type = change.entity_type;

        let outcome = self.record_change(change).await;

        if let Err(error) = &outcome {
            warn!(
                tenant_uuid = %tenant,
                entity_type = %entity_type,
                error = %error,
                "audit write failed; primary operation unaffected"
            );
        }

        outcome
    }

    #[tracing::instrument(
        name = "audit.service.list_changes",
        skip_all,
        fields(tenant_uuid = %tenant, entity_type = %entity_type),
        err
    )]
    async fn list_changes(
        &self,
        tenant: TenantUuid,
        entity_type: AuditEntityType,
        entity_id: &str,
    ) -> Result<Vec<AuditChangeRecord>, AuditServiceError> {
        let handle = self.router.tenant_handle(tenant).await?;

        self.repository
            .list_entity_changes(handle.pool(), tenant, entity_type, entity_id)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "audit.service.verify_chain",
        skip(self),
        fields(tenant_uuid = %tenant),
        err
    )]
    async fn verify_chain(&self, tenant: TenantUuid) -> Result<ChainVerification, AuditServiceError> {
        let handle = self.router.tenant_handle(tenant).await?;
        let records = self.repository.list_chain(handle.pool()).await?;

        let verification = chain::verify(&records)?;

        if let Some(broken) = verification.first_broken {
            warn!(
                sequence = broken.sequence,
                kind = ?broken.kind,
                "audit chain broken"
            );
        }

        Ok(verification)
    }
}

#[automock]
#[async_trait]
/// Tenant audit trail operations.
pub trait AuditService: Send + Sync {
    /// Diff and append one change to the tenant's audit chain.
    ///
    /// Runs in its own transaction on the tenant database, independent of the
    /// mutation being audited. Updates with an empty diff are skipped.
    async fn record_change(
        &self,
        change: NewAuditChange,
    ) -> Result<AuditOutcome, AuditServiceError>;

    /// [`AuditService::record_change`] for callers that must not fail on audit
    /// errors: failures are logged and returned for the caller to discard.
    async fn log_change(
        &self,
        change: NewAuditChange,
    ) -> Result<AuditOutcome, AuditServiceError>;

    /// Change history of one entity, newest first.
    async fn list_changes(
        &self,
        tenant: TenantUuid,
        entity_type: AuditEntityType,
        entity_id: &str,
    ) -> Result<Vec<AuditChangeRecord>, AuditServiceError>;

    /// Recompute the tenant's audit chain.
    async fn verify_chain(&self, tenant: TenantUuid) -> Result<ChainVerification, AuditServiceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use sqlx::query;
    use testresult::TestResult;

    use crate::{
        domain::audit::{diff::AuditSnapshot, records::FieldChange, request::RequestContext},
        test::TestContext,
    };

    use super::*;

    fn snapshot(value: Value) -> Result<AuditSnapshot, &'static str> {
        match value {
            Value::Object(map) => Ok(map),
            _ => Err("snapshot must be a JSON object"),
        }
    }

    fn vehicle_change(
        tenant: TenantUuid,
        action: AuditAction,
        old: Option<AuditSnapshot>,
        new: Option<AuditSnapshot>,
    ) -> NewAuditChange {
        NewAuditChange {
            tenant,
            entity_type: AuditEntityType::Vehicle,
            entity_id: "vehicle-1".to_string(),
            action,
            old,
            new,
            user_id: Some("user-7".to_string()),
            request: RequestContext::from_headers([
                ("X-Forwarded-For", "203.0.113.7, 10.0.0.1"),
                ("User-Agent", "fleet-app/2.1"),
            ]),
        }
    }

    #[tokio::test]
    async fn create_is_recorded_in_tenant_database() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;

        let outcome = ctx
            .audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Create,
                None,
                Some(snapshot(json!({ "plate": "AB-123", "note": "" }))?),
            ))
            .await?;

        let AuditOutcome::Recorded(record) = outcome else {
            return Err("expected a recorded change".into());
        };

        assert_eq!(record.tenant_uuid, tenant);
        assert_eq!(record.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(record.user_agent.as_deref(), Some("fleet-app/2.1"));
        assert_eq!(record.previous_hash, None);
        assert_eq!(
            record.changes.get("plate"),
            Some(&FieldChange {
                old: Value::Null,
                new: json!("AB-123"),
            })
        );
        assert!(!record.changes.contains_key("note"));

        Ok(())
    }

    #[tokio::test]
    async fn unchanged_update_is_skipped() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;

        let outcome = ctx
            .audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Update,
                Some(snapshot(json!({ "plate": "AB-123", "note": null }))?),
                Some(snapshot(json!({ "plate": "AB-123", "note": "" }))?),
            ))
            .await?;

        assert_eq!(outcome, AuditOutcome::SkippedEmptyUpdate);
        assert!(
            ctx.audit
                .list_changes(tenant, AuditEntityType::Vehicle, "vehicle-1")
                .await?
                .is_empty()
        );

        Ok(())
    }

    #[tokio::test]
    async fn history_is_listed_newest_first_and_chained() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;

        ctx.audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Create,
                None,
                Some(snapshot(json!({ "plate": "AB-123" }))?),
            ))
            .await?;

        ctx.audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Update,
                Some(snapshot(json!({ "plate": "AB-123" }))?),
                Some(snapshot(json!({ "plate": "CD-456" }))?),
            ))
            .await?;

        let history = ctx
            .audit
            .list_changes(tenant, AuditEntityType::Vehicle, "vehicle-1")
            .await?;

        let actions: Vec<AuditAction> = history.iter().map(|record| record.action).collect();

        assert_eq!(actions, vec![AuditAction::Update, AuditAction::Create]);

        let (Some(newest), Some(oldest)) = (history.first(), history.last()) else {
            return Err("expected two records".into());
        };

        assert_eq!(newest.previous_hash.as_deref(), Some(oldest.record_hash.as_str()));

        let verification = ctx.audit.verify_chain(tenant).await?;

        assert!(verification.is_intact());
        assert_eq!(verification.checked, 2);

        Ok(())
    }

    #[tokio::test]
    async fn large_and_negative_zero_floats_verify_after_storage() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;

        ctx.audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Create,
                None,
                Some(snapshot(json!({ "odometer": 1e16, "offset": -0.0 }))?),
            ))
            .await?;

        ctx.audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Update,
                Some(snapshot(json!({ "odometer": 1e16 }))?),
                Some(snapshot(json!({ "odometer": 2.5e17 }))?),
            ))
            .await?;

        let verification = ctx.audit.verify_chain(tenant).await?;

        assert!(verification.is_intact(), "{verification:?}");
        assert_eq!(verification.checked, 2);

        let history = ctx
            .audit
            .list_changes(tenant, AuditEntityType::Vehicle, "vehicle-1")
            .await?;

        let oldest = history.last().ok_or("expected the create record")?;

        assert_eq!(
            oldest.changes.get("odometer").map(|change| &change.new),
            Some(&json!(1e16))
        );

        Ok(())
    }

    #[tokio::test]
    async fn audit_rows_cannot_be_modified_or_deleted() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;

        ctx.audit
            .record_change(vehicle_change(
                tenant,
                AuditAction::Delete,
                Some(snapshot(json!({ "plate": "AB-123" }))?),
                None,
            ))
            .await?;

        let handle = ctx.router.tenant_handle(tenant).await?;

        let update = query("UPDATE audit_changes SET entity_id = 'tampered'")
            .execute(handle.pool())
            .await;
        let delete = query("DELETE FROM audit_changes").execute(handle.pool()).await;

        assert!(update.is_err(), "update should be rejected");
        assert!(delete.is_err(), "delete should be rejected");

        Ok(())
    }

    #[tokio::test]
    async fn write_for_another_tenant_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let acme = ctx.provision_tenant("Acme").await;
        let globex = ctx.create_tenant("Globex").await;

        // Routed to Acme's database while carrying Globex's identity.
        let handle = ctx.router.tenant_handle(acme).await?;
        let mut tx = handle.begin_transaction().await?;

        let result = query(
            "INSERT INTO audit_changes \
             (uuid, tenant_uuid, entity_type, entity_id, action, changes, created_at, record_hash) \
             VALUES ($1, $2, 'vehicle', 'v-1', 'CREATE', '{}', now(), 'x')",
        )
        .bind(AuditChangeUuid::new().into_uuid())
        .bind(globex.into_uuid())
        .execute(&mut *tx)
        .await
        .map_err(AuditServiceError::from);

        assert!(
            matches!(result, Err(AuditServiceError::UnknownTenant)),
            "expected UnknownTenant, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn log_change_absorbs_unreachable_tenant_database() {
        let ctx = TestContext::new().await;

        // Registered but never provisioned, so its database does not exist.
        let tenant = ctx.create_tenant("Unprovisioned").await;

        let result = ctx
            .audit
            .log_change(vehicle_change(
                tenant,
                AuditAction::Create,
                None,
                Some(serde_json::Map::from_iter([(
                    "plate".to_string(),
                    json!("AB-123"),
                )])),
            ))
            .await;

        assert!(
            matches!(result, Err(AuditServiceError::Router(_))),
            "expected Router error, got {result:?}"
        );
    }
}
