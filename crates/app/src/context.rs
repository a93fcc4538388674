//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{AppConfig, ConfigError, MigratorKind, ProvisioningConfig},
    database::{self, Db},
    domain::{
        access::{AccessService, TenantAccessService},
        audit::{AuditService, PgAuditService},
        numbering::DocumentNumberAllocator,
        provisioning::{
            CommandSchemaMigrator, EmbeddedSchemaMigrator, MigrationError, PgProvisioningService,
            ProvisioningService, SchemaMigrator,
        },
        tenants::{PgTenantsService, TenantsService},
    },
    tenancy::{ConnectionRouter, DatabaseNaming, NamingError, PgPoolConnector},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid registry connection string")]
    Naming(#[from] NamingError),

    #[error("failed to connect to registry database")]
    Database(#[source] sqlx::Error),

    #[error("invalid schema migrator")]
    Migrator(#[from] MigrationError),
}

/// Services wired against one registry database and one connection router.
#[derive(Clone)]
pub struct AppContext {
    pub router: Arc<ConnectionRouter>,
    pub tenants: Arc<dyn TenantsService>,
    pub access: Arc<dyn AccessService>,
    pub provisioning: Arc<dyn ProvisioningService>,
    pub audit: Arc<dyn AuditService>,
    pub numbering: DocumentNumberAllocator,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration is incomplete or the registry
    /// database cannot be reached.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppInitError> {
        let registry_url = config.database.registry_url()?;
        let naming = DatabaseNaming::new(registry_url)?;

        let pool = database::connect(registry_url)
            .await
            .map_err(AppInitError::Database)?;

        let registry = Db::new(pool);

        let router = Arc::new(ConnectionRouter::new(
            naming,
            registry.clone(),
            Arc::new(PgPoolConnector::new(
                config.database.tenant_pool_max_connections,
            )),
        ));

        let tenants: Arc<dyn TenantsService> = Arc::new(PgTenantsService::new(&registry));

        let provisioning = PgProvisioningService::new(
            config.provisioning.admin_database_url.clone(),
            config.provisioning.gate(),
            Arc::clone(&tenants),
            Arc::clone(&router),
            schema_migrator(&config.provisioning)?,
        );

        Ok(Self {
            access: Arc::new(TenantAccessService::new(Arc::clone(&tenants))),
            provisioning: Arc::new(provisioning),
            audit: Arc::new(PgAuditService::new(Arc::clone(&router))),
            numbering: DocumentNumberAllocator::new(),
            tenants,
            router,
        })
    }

    /// Close every cached tenant pool and the registry pool.
    pub async fn close(&self) {
        self.router.close().await;
    }
}

fn schema_migrator(config: &ProvisioningConfig) -> Result<Arc<dyn SchemaMigrator>, AppInitError> {
    match config.schema_migrator {
        MigratorKind::Embedded => Ok(Arc::new(EmbeddedSchemaMigrator::new())),
        MigratorKind::Command => {
            let command = config
                .schema_migrator_command
                .as_deref()
                .ok_or(ConfigError::MissingMigratorCommand)?;

            Ok(Arc::new(CommandSchemaMigrator::parse(command)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AppEnvironment;

    use super::*;

    fn provisioning(kind: MigratorKind, command: Option<&str>) -> ProvisioningConfig {
        ProvisioningConfig {
            admin_database_url: None,
            tenant_provisioning_enabled: false,
            app_env: AppEnvironment::Test,
            schema_migrator: kind,
            schema_migrator_command: command.map(str::to_string),
        }
    }

    #[test]
    fn command_migrator_requires_a_command() {
        let result = schema_migrator(&provisioning(MigratorKind::Command, None));

        assert!(matches!(
            result,
            Err(AppInitError::Config(ConfigError::MissingMigratorCommand))
        ));
    }

    #[test]
    fn blank_migrator_command_is_rejected() {
        let result = schema_migrator(&provisioning(MigratorKind::Command, Some("  ")));

        assert!(matches!(
            result,
            Err(AppInitError::Migrator(MigrationError::EmptyCommand))
        ));
    }

    #[test]
    fn embedded_migrator_needs_no_command() {
        assert!(schema_migrator(&provisioning(MigratorKind::Embedded, None)).is_ok());
    }
}
