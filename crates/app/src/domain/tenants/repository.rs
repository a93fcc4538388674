//! Tenants Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};

use crate::{
    database::{decode_count, encode_count},
    domain::tenants::{
        data::{BlockTenant, NewTenant},
        records::{
            SubscriptionStatus, TenantBlock, TenantQuotas, TenantRecord, TenantUsage, TenantUuid,
        },
    },
};

const CREATE_TENANT_SQL: &str = include_str!("sql/create_tenant.sql");
const GET_TENANT_SQL: &str = include_str!("sql/get_tenant.sql");
const LIST_TENANTS_SQL: &str = include_str!("sql/list_tenants.sql");
const BLOCK_TENANT_SQL: &str = include_str!("sql/block_tenant.sql");
const UNBLOCK_TENANT_SQL: &str = include_str!("sql/unblock_tenant.sql");

#[derive(Debug, Clone)]
/// PostgreSQL-backed tenants repository over the registry database.
pub(crate) struct PgTenantsRepository {
    pool: PgPool,
}

impl PgTenantsRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(
        name = "tenants.repository.create_tenant",
        skip(self, tenant),
        fields(tenant_uuid = %tenant.uuid),
        err
    )]
    pub(crate) async fn create_tenant(
        &self,
        tenant: NewTenant,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(CREATE_TENANT_SQL)
            .bind(tenant.uuid.into_uuid())
            .bind(tenant.name)
            .bind(tenant.tax_id)
            .bind(tenant.registration_number)
            .bind(tenant.email)
            .bind(tenant.subscription_status.as_str())
            .bind(tenant.subscription_plan)
            .bind(tenant.subscription_end_date.map(SqlxTimestamp::from))
            .bind(encode_count(tenant.quotas.max_users)?)
            .bind(encode_count(tenant.quotas.max_vehicles)?)
            .bind(encode_count(tenant.quotas.max_orders_per_month)?)
            .bind(tenant.default_vat_rate)
            .fetch_one(&self.pool)
            .await
    }

    pub(crate) async fn find_tenant(
        &self,
        tenant: TenantUuid,
    ) -> Result<Option<TenantRecord>, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(GET_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_optional(&self.pool)
            .await
    }

    pub(crate) async fn list_tenants(&self) -> Result<Vec<TenantRecord>, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(LIST_TENANTS_SQL)
            .fetch_all(&self.pool)
            .await
    }

    #[tracing::instrument(
        name = "tenants.repository.block_tenant",
        skip(self, block),
        fields(tenant_uuid = %tenant),
        err
    )]
    pub(crate) async fn block_tenant(
        &self,
        tenant: TenantUuid,
        block: BlockTenant,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(BLOCK_TENANT_SQL)
            .bind(tenant.into_uuid())
            .bind(block.reason)
            .bind(block.blocked_by)
            .fetch_one(&self.pool)
            .await
    }

    #[tracing::instrument(
        name = "tenants.repository.unblock_tenant",
        skip(self),
        fields(tenant_uuid = %tenant),
        err
    )]
    pub(crate) async fn unblock_tenant(
        &self,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(UNBLOCK_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&self.pool)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for TenantRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("subscription_status")?;

        let subscription_status =
            status
                .parse::<SubscriptionStatus>()
                .map_err(|e| sqlx::Error::ColumnDecode {
                    index: "subscription_status".to_string(),
                    source: Box::new(e),
                })?;

        let block = if row.try_get::<bool, _>("is_blocked")? {
            Some(TenantBlock {
                reason: row.try_get("blocked_reason")?,
                blocked_at: row.try_get::<SqlxTimestamp, _>("blocked_at")?.to_jiff(),
                blocked_by: row.try_get("blocked_by")?,
            })
        } else {
            None
        };

        Ok(Self {
            uuid: TenantUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            tax_id: row.try_get("tax_id")?,
            registration_number: row.try_get("registration_number")?,
            email: row.try_get("email")?,
            subscription_status,
            subscription_plan: row.try_get("subscription_plan")?,
            subscription_end_date: row
                .try_get::<Option<SqlxTimestamp>, _>("subscription_end_date")?
                .map(SqlxTimestamp::to_jiff),
            is_active: row.try_get("is_active")?,
            block,
            quotas: TenantQuotas {
                max_users: decode_count(row, "max_users")?,
                max_vehicles: decode_count(row, "max_vehicles")?,
                max_orders_per_month: decode_count(row, "max_orders_per_month")?,
            },
            usage: TenantUsage {
                current_users_count: decode_count(row, "current_users_count")?,
                current_vehicles_count: decode_count(row, "current_vehicles_count")?,
                orders_this_month: decode_count(row, "orders_this_month")?,
                last_reset_date: row
                    .try_get::<SqlxTimestamp, _>("last_reset_date")?
                    .to_jiff(),
            },
            default_vat_rate: row.try_get("default_vat_rate")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
