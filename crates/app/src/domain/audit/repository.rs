//! Audit Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, PgPool, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
};

use crate::domain::{
    audit::records::{AuditAction, AuditChangeRecord, AuditChangeUuid, AuditEntityType},
    tenants::records::TenantUuid,
};

const LOCK_CHAIN_SQL: &str = include_str!("sql/lock_chain.sql");
const LATEST_RECORD_HASH_SQL: &str = include_str!("sql/latest_record_hash.sql");
const CREATE_AUDIT_CHANGE_SQL: &str = include_str!("sql/create_audit_change.sql");
const LIST_ENTITY_CHANGES_SQL: &str = include_str!("sql/list_entity_changes.sql");
const LIST_CHAIN_SQL: &str = include_str!("sql/list_chain.sql");

/// Advisory lock key serializing appends to a tenant database's audit chain.
const AUDIT_CHAIN_LOCK_KEY: i64 = 0x6175_6469_745f_6368;

/// Row to append, with its chain hashes already computed.
#[derive(Debug)]
pub(crate) struct AuditChangeRow<'a> {
    pub uuid: AuditChangeUuid,
    pub tenant_uuid: TenantUuid,
    pub entity_type: AuditEntityType,
    pub entity_id: &'a str,
    pub action: AuditAction,
    pub changes_json: &'a str,
    pub user_id: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub created_at: jiff::Timestamp,
    pub previous_hash: Option<&'a str>,
    pub record_hash: &'a str,
}

/// Audit storage inside one tenant database. Stateless; the caller picks the
/// database by passing a transaction or pool.
#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuditRepository;

impl PgAuditRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Hold the chain lock until `tx` ends.
    pub(crate) async fn lock_chain(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<(), sqlx::Error> {
        query(LOCK_CHAIN_SQL)
            .bind(AUDIT_CHAIN_LOCK_KEY)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn latest_record_hash(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<String>, sqlx::Error> {
        query_scalar::<Postgres, String>(LATEST_RECORD_HASH_SQL)
            .fetch_optional(&mut **tx)
            .await
    }

    #[tracing::instrument(
        name = "audit.repository.create_audit_change",
        skip(self, tx, row),
        fields(
            tenant_uuid = %row.tenant_uuid,
            entity_type = %row.entity_type,
            action = %row.action,
        ),
        err
    )]
    pub(crate) async fn create_audit_change(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: AuditChangeRow<'_>,
    ) -> Result<AuditChangeRecord, sqlx::Error> {
        query_as::<Postgres, AuditChangeRecord>(CREATE_AUDIT_CHANGE_SQL)
            .bind(row.uuid.into_uuid())
            .bind(row.tenant_uuid.into_uuid())
            .bind(row.entity_type.as_str())
            .bind(row.entity_id)
            .bind(row.action.as_str())
            .bind(row.changes_json)
            .bind(row.user_id)
            .bind(row.ip_address)
            .bind(row.user_agent)
            .bind(SqlxTimestamp::from(row.created_at))
            .bind(row.previous_hash)
            .bind(row.record_hash)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_entity_changes(
        &self,
        pool: &PgPool,
        tenant: TenantUuid,
        entity_type: AuditEntityType,
        entity_id: &str,
    ) -> Result<Vec<AuditChangeRecord>, sqlx::Error> {
        query_as::<Postgres, AuditChangeRecord>(LIST_ENTITY_CHANGES_SQL)
            .bind(tenant.into_uuid())
            .bind(entity_type.as_str())
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }

    pub(crate) async fn list_chain(
        &self,
        pool: &PgPool,
    ) -> Result<Vec<AuditChangeRecord>, sqlx::Error> {
        query_as::<Postgres, AuditChangeRecord>(LIST_CHAIN_SQL)
            .fetch_all(pool)
            .await
    }
}

fn decode_column<T, E>(column: &str, parsed: Result<T, E>) -> Result<T, sqlx::Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parsed.map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for AuditChangeRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let entity_type: String = row.try_get("entity_type")?;
        let action: String = row.try_get("action")?;
        let changes_json: String = row.try_get("changes")?;

        Ok(Self {
            uuid: AuditChangeUuid::from_uuid(row.try_get("uuid")?),
            sequence: row.try_get("sequence")?,
            tenant_uuid: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            entity_type: decode_column("entity_type", entity_type.parse())?,
            entity_id: row.try_get("entity_id")?,
            action: decode_column("action", action.parse())?,
            changes: decode_column("changes", serde_json::from_str(&changes_json))?,
            changes_json,
            user_id: row.try_get("user_id")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            previous_hash: row.try_get("previous_hash")?,
            record_hash: row.try_get("record_hash")?,
        })
    }
}
