//! Database Config

use clap::Args;

use crate::config::ConfigError;

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// Default `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Registry (master) `PostgreSQL` connection string; defaults to `DATABASE_URL`
    #[arg(long, env = "MASTER_DATABASE_URL", hide_env_values = true)]
    pub master_database_url: Option<String>,

    /// Connection limit for each tenant database pool
    #[arg(long, env = "TENANT_POOL_MAX_CONNECTIONS", default_value_t = 5_u32)]
    pub tenant_pool_max_connections: u32,
}

impl DatabaseConfig {
    /// Registry connection string, falling back to the default connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRegistryUrl`] when neither is set.
    pub fn registry_url(&self) -> Result<&str, ConfigError> {
        self.master_database_url
            .as_deref()
            .or(self.database_url.as_deref())
            .ok_or(ConfigError::MissingRegistryUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: Option<&str>, master_database_url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            database_url: database_url.map(str::to_string),
            master_database_url: master_database_url.map(str::to_string),
            tenant_pool_max_connections: 5,
        }
    }

    #[test]
    fn registry_url_prefers_master_url() {
        let config = config(Some("postgres://a/app"), Some("postgres://b/fleetdesk_master"));

        assert_eq!(config.registry_url().ok(), Some("postgres://b/fleetdesk_master"));
    }

    #[test]
    fn registry_url_falls_back_to_database_url() {
        let config = config(Some("postgres://a/app"), None);

        assert_eq!(config.registry_url().ok(), Some("postgres://a/app"));
    }

    #[test]
    fn registry_url_is_required() {
        assert!(matches!(
            config(None, None).registry_url(),
            Err(ConfigError::MissingRegistryUrl)
        ));
    }
}
