//! Tenant database naming.
//!
//! Every tenant lives in its own database named `<namespace>_tenant_<id>`,
//! next to the registry database `<namespace>_master`. Tenant connection strings
//! are derived from a base connection string by swapping only the database
//! segment, so host, port, credentials and query parameters carry over unchanged.

use thiserror::Error;
use url::Url;

use crate::domain::tenants::records::TenantUuid;

/// Namespace shared by the registry and every tenant database.
pub const DATABASE_NAMESPACE: &str = "fleetdesk";

/// Errors raised while validating naming inputs.
#[derive(Debug, Error)]
pub enum NamingError {
    /// Base connection string could not be parsed.
    #[error("invalid base connection string")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// Base connection string cannot carry a database path segment.
    #[error("base connection string cannot carry a database name")]
    CannotBeABase,

    /// Namespace is empty or not a plain identifier.
    #[error("invalid database namespace `{0}`")]
    InvalidNamespace(String),
}

/// Derives tenant database names and connection strings.
#[derive(Debug, Clone)]
pub struct DatabaseNaming {
    namespace: String,
    base_url: Url,
}

impl DatabaseNaming {
    /// Naming under [`DATABASE_NAMESPACE`].
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` is not a hierarchical connection string.
    pub fn new(base_url: &str) -> Result<Self, NamingError> {
        Self::with_namespace(DATABASE_NAMESPACE, base_url)
    }

    /// Naming under a custom namespace.
    ///
    /// # Errors
    ///
    /// Returns an error when the namespace is not a lowercase identifier or
    /// `base_url` is not a hierarchical connection string.
    pub fn with_namespace(namespace: &str, base_url: &str) -> Result<Self, NamingError> {
        let valid_namespace = namespace
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
            && namespace
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !valid_namespace {
            return Err(NamingError::InvalidNamespace(namespace.to_string()));
        }

        let base_url = Url::parse(base_url).map_err(NamingError::InvalidBaseUrl)?;

        if base_url.cannot_be_a_base() {
            return Err(NamingError::CannotBeABase);
        }

        Ok(Self {
            namespace: namespace.to_string(),
            base_url,
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the registry database.
    #[must_use]
    pub fn registry_database_name(&self) -> String {
        format!("{}_master", self.namespace)
    }

    /// Name of the tenant's isolated database.
    ///
    /// The identifier is rendered in its 32-digit hex form, which keeps the name a
    /// plain lowercase identifier under Postgres' 63 byte limit.
    #[must_use]
    pub fn database_name(&self, tenant: TenantUuid) -> String {
        format!("{}_tenant_{}", self.namespace, tenant.into_uuid().simple())
    }

    /// Connection string for the tenant's isolated database.
    #[must_use]
    pub fn database_url(&self, tenant: TenantUuid) -> String {
        self.url_for_database(&self.database_name(tenant))
    }

    /// Base connection string with its database segment replaced by `database`.
    #[must_use]
    pub fn url_for_database(&self, database: &str) -> String {
        let mut url = self.base_url.clone();

        url.set_path(&format!("/{database}"));

        url.to_string()
    }
}

/// Canonical form of a connection string, used as a cache key.
///
/// Strings that do not parse are returned unchanged.
#[must_use]
pub fn canonical_url(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), String::from)
}
