//! Provisioning service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::Connection;
use tracing::{info, warn};

use crate::{
    config::ConfigError,
    domain::{
        provisioning::{
            errors::ProvisioningError,
            gate::ProvisioningGate,
            migrator::SchemaMigrator,
            report::{DatabaseCreation, ProvisioningReport, TenantRegistration},
            repository::PgProvisioningRepository,
        },
        tenants::{
            TenantsService,
            data::NewTenant,
            records::{TenantRecord, TenantUuid},
        },
    },
    tenancy::ConnectionRouter,
};

/// Creates and initializes tenant databases.
#[derive(Clone)]
pub struct PgProvisioningService {
    admin_url: Option<String>,
    gate: ProvisioningGate,
    tenants: Arc<dyn TenantsService>,
    router: Arc<ConnectionRouter>,
    migrator: Arc<dyn SchemaMigrator>,
    repository: PgProvisioningRepository,
}

impl std::fmt::Debug for PgProvisioningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgProvisioningService")
            .field("gate", &self.gate)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl PgProvisioningService {
    #[must_use]
    pub fn new(
        admin_url: Option<String>,
        gate: ProvisioningGate,
        tenants: Arc<dyn TenantsService>,
        router: Arc<ConnectionRouter>,
        migrator: Arc<dyn SchemaMigrator>,
    ) -> Self {
        Self {
            admin_url,
            gate,
            tenants,
            router,
            migrator,
            repository: PgProvisioningRepository::new(),
        }
    }

    async fn registry_record(&self, tenant: TenantUuid) -> Result<TenantRecord, ProvisioningError> {
        self.tenants
            .find_tenant(tenant)
            .await?
            .ok_or(ProvisioningError::TenantNotFound)
    }
}

#[async_trait]
impl ProvisioningService for PgProvisioningService {
    #[tracing::instrument(
        name = "provisioning.service.register_tenant",
        skip_all,
        fields(tenant_uuid = %tenant.uuid),
        err
    )]
    async fn register_tenant(
        &self,
        tenant: NewTenant,
    ) -> Result<TenantRegistration, ProvisioningError> {
        let record = self.tenants.create_tenant(tenant).await?;

        if !self.gate.allows_automatic() {
            info!("automatic provisioning disabled; run tenant provisioning explicitly");

            return Ok(TenantRegistration {
                tenant: record,
                provisioning: None,
            });
        }

        let report = self.provision(record.uuid).await?;

        Ok(TenantRegistration {
            tenant: record,
            provisioning: Some(report),
        })
    }

    #[tracing::instrument(
        name = "provisioning.service.provision",
        skip(self),
        fields(tenant_uuid = %tenant),
        err
    )]
    async fn provision(&self, tenant: TenantUuid) -> Result<ProvisioningReport, ProvisioningError> {
        self.registry_record(tenant).await?;

        let creation = self.create_database(tenant).await?;

        self.apply_schema(tenant).await?;
        self.sync_bootstrap(tenant).await?;

        let database_name = self.router.naming().database_name(tenant);

        info!(database = %database_name, ?creation, "tenant database provisioned");

        Ok(ProvisioningReport {
            tenant,
            database_name,
            creation,
        })
    }

    async fn create_database(&self, tenant: TenantUuid) -> Result<DatabaseCreation, ProvisioningError> {
        let admin_url = self
            .admin_url
            .as_deref()
            .ok_or(ConfigError::MissingAdminUrl)?;

        let database = self.router.naming().database_name(tenant);

        let mut admin = self
            .repository
            .connect_admin(admin_url)
            .await
            .map_err(ProvisioningError::AdminConnect)?;

        let created = self.repository.create_database(&mut admin, &database).await;

        if let Err(error) = admin.close().await {
            warn!(%error, "failed to close administrative connection");
        }

        created.map_err(|source| ProvisioningError::CreateDatabase { database, source })
    }

    async fn apply_schema(&self, tenant: TenantUuid) -> Result<(), ProvisioningError> {
        let naming = self.router.naming();

        self.migrator
            .apply(&naming.database_url(tenant))
            .await
            .map_err(|source| ProvisioningError::Schema {
                database: naming.database_name(tenant),
                source,
            })
    }

    async fn sync_bootstrap(&self, tenant: TenantUuid) -> Result<(), ProvisioningError> {
        let record = self.registry_record(tenant).await?;
        let handle = self.router.tenant_handle(tenant).await?;

        self.repository
            .upsert_bootstrap_tenant(handle.pool(), &record)
            .await
            .map_err(ProvisioningError::Bootstrap)
    }

    #[tracing::instrument(
        name = "provisioning.service.repair",
        skip(self),
        fields(tenant_uuid = %tenant),
        err
    )]
    async fn repair(&self, tenant: TenantUuid) -> Result<ProvisioningReport, ProvisioningError> {
        // Requests already holding the old handle finish on it.
        self.router.invalidate(tenant).await;

        self.provision(tenant).await
    }

    #[tracing::instrument(name = "provisioning.service.repair_all", skip(self), err)]
    async fn repair_all(
        &self,
    ) -> Result<Vec<(TenantUuid, Result<ProvisioningReport, ProvisioningError>)>, ProvisioningError>
    {
        let tenants = self.tenants.list_tenants().await?;
        let mut outcomes = Vec::with_capacity(tenants.len());

        for tenant in tenants {
            let outcome = self.provision(tenant.uuid).await;

            if let Err(error) = &outcome {
                warn!(tenant_uuid = %tenant.uuid, %error, "tenant repair failed");
            }

            outcomes.push((tenant.uuid, outcome));
        }

        Ok(outcomes)
    }
}

#[automock]
#[async_trait]
/// Tenant database provisioning.
///
/// Steps run in order without a cross-database transaction; each is idempotent
/// and can be retried on its own. A failed step leaves the registry row in place.
pub trait ProvisioningService: Send + Sync {
    /// Create a registry tenant, provisioning its database when the gate allows.
    async fn register_tenant(
        &self,
        tenant: NewTenant,
    ) -> Result<TenantRegistration, ProvisioningError>;

    /// Create, migrate and bootstrap the database of a registry tenant.
    async fn provision(&self, tenant: TenantUuid) -> Result<ProvisioningReport, ProvisioningError>;

    /// Create the tenant database with administrative credentials.
    async fn create_database(&self, tenant: TenantUuid) -> Result<DatabaseCreation, ProvisioningError>;

    /// Bring the tenant database schema up to date.
    async fn apply_schema(&self, tenant: TenantUuid) -> Result<(), ProvisioningError>;

    /// Upsert the tenant's bootstrap row from its registry record.
    async fn sync_bootstrap(&self, tenant: TenantUuid) -> Result<(), ProvisioningError>;

    /// Re-run provisioning for a registry tenant, dropping any cached handle first.
    async fn repair(&self, tenant: TenantUuid) -> Result<ProvisioningReport, ProvisioningError>;

    /// Re-run provisioning for every registry tenant, continuing past failures.
    async fn repair_all(
        &self,
    ) -> Result<Vec<(TenantUuid, Result<ProvisioningReport, ProvisioningError>)>, ProvisioningError>;
}
