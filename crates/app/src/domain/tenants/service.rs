//! Tenants service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::tenants::{
        data::{BlockTenant, NewTenant},
        errors::TenantsServiceError,
        records::{TenantRecord, TenantUuid},
        repository::PgTenantsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgTenantsService {
    repository: PgTenantsRepository,
}

impl PgTenantsService {
    /// Build a service over the registry database.
    #[must_use]
    pub fn new(registry: &Db) -> Self {
        Self {
            repository: PgTenantsRepository::new(registry.pool().clone()),
        }
    }
}

#[async_trait]
impl TenantsService for PgTenantsService {
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError> {
        self.repository
            .create_tenant(tenant)
            .await
            .map_err(Into::into)
    }

    async fn get_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError> {
        self.find_tenant(tenant)
            .await?
            .ok_or(TenantsServiceError::NotFound)
    }

    async fn find_tenant(
        &self,
        tenant: TenantUuid,
    ) -> Result<Option<TenantRecord>, TenantsServiceError> {
        self.repository
            .find_tenant(tenant)
            .await
            .map_err(Into::into)
    }

    async fn list_tenants(&self) -> Result<Vec<TenantRecord>, TenantsServiceError> {
        self.repository.list_tenants().await.map_err(Into::into)
    }

    async fn block_tenant(
        &self,
        tenant: TenantUuid,
        block: BlockTenant,
    ) -> Result<TenantRecord, TenantsServiceError> {
        self.repository
            .block_tenant(tenant, block)
            .await
            .map_err(Into::into)
    }

    async fn unblock_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError> {
        self.repository
            .unblock_tenant(tenant)
            .await
            .map_err(Into::into)
    }
}

#[automock]
#[async_trait]
/// Registry tenant operations.
pub trait TenantsService: Send + Sync {
    /// Creates a new tenant.
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError>;

    /// Fetch a tenant, failing with [`TenantsServiceError::NotFound`] when absent.
    async fn get_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError>;

    /// Fetch a tenant if it exists.
    async fn find_tenant(
        &self,
        tenant: TenantUuid,
    ) -> Result<Option<TenantRecord>, TenantsServiceError>;

    /// All registry tenants, oldest first.
    async fn list_tenants(&self) -> Result<Vec<TenantRecord>, TenantsServiceError>;

    /// Block a tenant. Reason, time and actor are written together.
    async fn block_tenant(
        &self,
        tenant: TenantUuid,
        block: BlockTenant,
    ) -> Result<TenantRecord, TenantsServiceError>;

    /// Unblock a tenant, clearing all block metadata.
    async fn unblock_tenant(&self, tenant: TenantUuid) -> Result<TenantRecord, TenantsServiceError>;
}
