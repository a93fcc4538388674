//! Provisioning Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Connection, PgConnection, PgPool, Postgres, query, query_scalar};

use crate::{
    database::encode_count,
    domain::{provisioning::report::DatabaseCreation, tenants::records::TenantRecord},
};

const QUOTE_DATABASE_NAME_SQL: &str = include_str!("sql/quote_database_name.sql");
const UPSERT_BOOTSTRAP_TENANT_SQL: &str = include_str!("sql/upsert_bootstrap_tenant.sql");

/// `duplicate_database`
const DUPLICATE_DATABASE: &str = "42P04";

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProvisioningRepository;

impl PgProvisioningRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Create `database` over an administrative connection. An existing
    /// database counts as success.
    #[tracing::instrument(
        name = "provisioning.repository.create_database",
        skip(self, admin),
        err
    )]
    pub(crate) async fn create_database(
        &self,
        admin: &mut PgConnection,
        database: &str,
    ) -> Result<DatabaseCreation, sqlx::Error> {
        let quoted = query_scalar::<Postgres, String>(QUOTE_DATABASE_NAME_SQL)
            .bind(database)
            .fetch_one(&mut *admin)
            .await?;

        let created = query(&format!("CREATE DATABASE {quoted}"))
            .execute(&mut *admin)
            .await;

        match created {
            Ok(_) => Ok(DatabaseCreation::Created),
            Err(error)
                if error
                    .as_database_error()
                    .and_then(|e| e.code())
                    .is_some_and(|code| code == DUPLICATE_DATABASE) =>
            {
                Ok(DatabaseCreation::AlreadyExisted)
            }
            Err(error) => Err(error),
        }
    }

    /// Open an administrative connection.
    pub(crate) async fn connect_admin(&self, admin_url: &str) -> Result<PgConnection, sqlx::Error> {
        PgConnection::connect(admin_url).await
    }

    /// Mirror the registry's public fields into the tenant database.
    #[tracing::instrument(
        name = "provisioning.repository.upsert_bootstrap_tenant",
        skip(self, pool, tenant),
        fields(tenant_uuid = %tenant.uuid),
        err
    )]
    pub(crate) async fn upsert_bootstrap_tenant(
        &self,
        pool: &PgPool,
        tenant: &TenantRecord,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_BOOTSTRAP_TENANT_SQL)
            .bind(tenant.uuid.into_uuid())
            .bind(&tenant.name)
            .bind(tenant.tax_id.as_deref())
            .bind(tenant.registration_number.as_deref())
            .bind(tenant.email.as_deref())
            .bind(tenant.subscription_status.as_str())
            .bind(&tenant.subscription_plan)
            .bind(tenant.is_active)
            .bind(tenant.is_blocked())
            .bind(tenant.block.as_ref().and_then(|block| block.reason.as_deref()))
            .bind(encode_count(tenant.quotas.max_users)?)
            .bind(encode_count(tenant.quotas.max_vehicles)?)
            .bind(encode_count(tenant.quotas.max_orders_per_month)?)
            .bind(tenant.default_vat_rate)
            .bind(SqlxTimestamp::from(tenant.created_at))
            .bind(SqlxTimestamp::from(tenant.updated_at))
            .execute(pool)
            .await?;

        Ok(())
    }
}
