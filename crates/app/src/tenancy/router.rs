//! Connection Router

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::{
    database::{self, Db},
    domain::tenants::records::TenantUuid,
    tenancy::naming::{DatabaseNaming, canonical_url},
};

/// Shared handle to one database. Clones point at the same pool.
pub type TenantHandle = Arc<Db>;

/// Router errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The database could not be reached. Failed attempts are not cached.
    #[error("failed to connect to database `{database}`")]
    Connect {
        database: String,
        #[source]
        source: sqlx::Error,
    },
}

#[automock]
#[async_trait]
/// Opens connection pools.
pub trait PoolConnector: Send + Sync {
    /// Open a pool for `url`.
    async fn connect(&self, url: &str) -> Result<PgPool, sqlx::Error>;
}

/// Opens `PostgreSQL` pools, establishing one connection eagerly.
#[derive(Debug, Clone, Copy)]
pub struct PgPoolConnector {
    max_connections: u32,
}

impl PgPoolConnector {
    #[must_use]
    pub fn new(max_connections: u32) -> Self {
        Self { max_connections }
    }
}

#[async_trait]
impl PoolConnector for PgPoolConnector {
    async fn connect(&self, url: &str) -> Result<PgPool, sqlx::Error> {
        database::connect_with_max(url, self.max_connections).await
    }
}

/// Routes tenant-scoped work to the tenant's own database.
///
/// Handles are cached by canonical connection string for the router's lifetime.
/// Construct one per process and share it; tests build their own.
pub struct ConnectionRouter {
    naming: DatabaseNaming,
    registry: TenantHandle,
    connector: Arc<dyn PoolConnector>,
    handles: RwLock<FxHashMap<String, TenantHandle>>,
}

impl fmt::Debug for ConnectionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRouter")
            .field("naming", &self.naming)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ConnectionRouter {
    #[must_use]
    pub fn new(naming: DatabaseNaming, registry: Db, connector: Arc<dyn PoolConnector>) -> Self {
        Self {
            naming,
            registry: Arc::new(registry),
            connector,
            handles: RwLock::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn naming(&self) -> &DatabaseNaming {
        &self.naming
    }

    /// Handle to the registry database.
    #[must_use]
    pub fn registry(&self) -> TenantHandle {
        Arc::clone(&self.registry)
    }

    /// Handle for a tenant, or the registry when `tenant` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Connect`] when the tenant database cannot be reached.
    pub async fn handle_for(&self, tenant: Option<TenantUuid>) -> Result<TenantHandle, RouterError> {
        match tenant {
            Some(tenant) => self.tenant_handle(tenant).await,
            None => Ok(self.registry()),
        }
    }

    /// Handle for a tenant's isolated database.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Connect`] when the tenant database cannot be reached.
    pub async fn tenant_handle(&self, tenant: TenantUuid) -> Result<TenantHandle, RouterError> {
        self.handle_for_url(&self.naming.database_url(tenant)).await
    }

    /// Handle for an explicit connection string.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Connect`] when the database cannot be reached.
    #[tracing::instrument(
        name = "tenancy.router.handle_for_url",
        skip_all,
        fields(database = %database_segment(url)),
        err
    )]
    pub async fn handle_for_url(&self, url: &str) -> Result<TenantHandle, RouterError> {
        let key = canonical_url(url);

        if let Some(handle) = self.handles.read().await.get(&key) {
            return Ok(Arc::clone(handle));
        }

        // Connect without holding the lock; racing misses each open a pool and
        // the first insert wins.
        let pool = self
            .connector
            .connect(url)
            .await
            .map_err(|source| RouterError::Connect {
                database: database_segment(url),
                source,
            })?;

        let created = Arc::new(Db::new(pool));

        let winner = {
            let mut handles = self.handles.write().await;

            Arc::clone(handles.entry(key).or_insert_with(|| Arc::clone(&created)))
        };

        if Arc::ptr_eq(&winner, &created) {
            debug!("opened tenant database handle");
        } else {
            debug!("discarding duplicate tenant database handle");

            created.close().await;
        }

        Ok(winner)
    }

    /// Evict the cached handle for a tenant. The pool stays open for
    /// requests still holding it and closes when the last clone drops.
    ///
    /// Returns `true` when a handle was cached.
    pub async fn invalidate(&self, tenant: TenantUuid) -> bool {
        let key = canonical_url(&self.naming.database_url(tenant));

        self.handles.write().await.remove(&key).is_some()
    }

    /// Evict every cached tenant handle without closing the pools.
    pub async fn clear(&self) {
        let evicted = self.drain().await.len();

        info!(evicted, "cleared tenant database handles");
    }

    /// Close every tenant handle and the registry handle.
    pub async fn close(&self) {
        let drained = self.drain().await;

        for handle in &drained {
            handle.close().await;
        }

        info!(closed = drained.len(), "closed tenant database handles");

        self.registry.close().await;
    }

    async fn drain(&self) -> Vec<TenantHandle> {
        self.handles
            .write()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect()
    }

    /// Number of cached tenant handles.
    pub async fn cached_handles(&self) -> usize {
        self.handles.read().await.len()
    }
}

fn database_segment(url: &str) -> String {
    Url::parse(url)
        .map(|url| url.path().trim_start_matches('/').to_string())
        .unwrap_or_default()
}
