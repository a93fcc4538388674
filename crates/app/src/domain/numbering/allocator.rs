//! Document Number Allocator

use jiff::{Timestamp, tz::TimeZone};
use sqlx::{Postgres, Transaction, query_scalar};

use crate::domain::{
    numbering::{errors::NumberingError, records::DocumentType},
    tenants::records::TenantUuid,
};

const NEXT_NUMBER_SQL: &str = include_str!("sql/next_number.sql");

/// Issues per-tenant, per-type document numbers that restart every UTC year.
///
/// Allocation is a single upsert on the counter row, so concurrent transactions
/// for the same key serialize on its row lock and never observe the same value.
/// Numbers are only consumed when the caller's transaction commits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentNumberAllocator;

impl DocumentNumberAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Allocate the next number inside `tx`, the transaction that inserts the
    /// numbered document.
    ///
    /// # Errors
    ///
    /// Returns [`NumberingError::UnknownTenant`] when `tenant` is not the tenant
    /// the database was provisioned for, or [`NumberingError::Sql`] on storage
    /// failure. Either leaves `tx` unusable.
    #[tracing::instrument(
        name = "numbering.allocator.next_number",
        skip(self, tx),
        fields(tenant_uuid = %tenant, document_type = %document_type),
        err
    )]
    pub async fn next_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        document_type: DocumentType,
        now: Timestamp,
    ) -> Result<String, NumberingError> {
        let year = i32::from(now.to_zoned(TimeZone::UTC).year());

        let allocated = query_scalar::<Postgres, i64>(NEXT_NUMBER_SQL)
            .bind(tenant.into_uuid())
            .bind(document_type.as_str())
            .bind(year)
            .fetch_one(&mut **tx)
            .await?;

        Ok(allocated.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use testresult::TestResult;
    use tokio::task::JoinSet;

    use crate::test::TestContext;

    use super::*;

    fn at(timestamp: &str) -> Result<Timestamp, jiff::Error> {
        timestamp.parse()
    }

    #[tokio::test]
    async fn numbers_start_at_one_and_increase() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;
        let handle = ctx.router.tenant_handle(tenant).await?;
        let now = at("2026-05-01T09:00:00Z")?;

        let mut tx = handle.begin_transaction().await?;

        let first = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Order, now)
            .await?;
        let second = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Order, now)
            .await?;

        tx.commit().await?;

        assert_eq!(first, "1");
        assert_eq!(second, "2");

        Ok(())
    }

    #[tokio::test]
    async fn document_types_have_independent_sequences() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;
        let handle = ctx.router.tenant_handle(tenant).await?;
        let now = at("2026-05-01T09:00:00Z")?;

        let mut tx = handle.begin_transaction().await?;

        ctx.numbering
            .next_number(&mut tx, tenant, DocumentType::Order, now)
            .await?;

        let invoice = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Invoice, now)
            .await?;
        let upd = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Upd, now)
            .await?;

        tx.commit().await?;

        assert_eq!(invoice, "1");
        assert_eq!(upd, "1");

        Ok(())
    }

    #[tokio::test]
    async fn new_year_restarts_sequence() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;
        let handle = ctx.router.tenant_handle(tenant).await?;

        let mut tx = handle.begin_transaction().await?;

        for expected in ["1", "2", "3"] {
            let number = ctx
                .numbering
                .next_number(&mut tx, tenant, DocumentType::Invoice, at("2025-12-31T23:59:59Z")?)
                .await?;

            assert_eq!(number, expected);
        }

        let january = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Invoice, at("2026-01-01T00:00:00Z")?)
            .await?;
        let next = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Invoice, at("2026-01-02T00:00:00Z")?)
            .await?;

        tx.commit().await?;

        assert_eq!(january, "1");
        assert_eq!(next, "2");

        Ok(())
    }

    #[tokio::test]
    async fn rolled_back_allocations_leave_no_gap() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;
        let handle = ctx.router.tenant_handle(tenant).await?;
        let now = Timestamp::now();

        let mut tx = handle.begin_transaction().await?;

        ctx.numbering
            .next_number(&mut tx, tenant, DocumentType::Order, now)
            .await?;

        tx.rollback().await?;

        let mut tx = handle.begin_transaction().await?;

        let number = ctx
            .numbering
            .next_number(&mut tx, tenant, DocumentType::Order, now)
            .await?;

        tx.commit().await?;

        assert_eq!(number, "1");

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_allocations_never_repeat() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;
        let handle = ctx.router.tenant_handle(tenant).await?;
        let now = Timestamp::now();

        let mut tasks = JoinSet::new();

        for _ in 0..10 {
            let handle = handle.clone();
            let allocator = ctx.numbering;

            tasks.spawn(async move {
                let mut tx = handle.begin_transaction().await?;

                let number = allocator
                    .next_number(&mut tx, tenant, DocumentType::Order, now)
                    .await?;

                tx.commit().await?;

                Ok::<String, Box<dyn std::error::Error + Send + Sync>>(number)
            });
        }

        let mut numbers = BTreeSet::new();

        while let Some(joined) = tasks.join_next().await {
            numbers.insert(joined??.parse::<u32>()?);
        }

        assert_eq!(numbers, (1..=10).collect::<BTreeSet<u32>>());

        Ok(())
    }

    #[tokio::test]
    async fn allocation_for_foreign_tenant_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.provision_tenant("Acme").await;
        let handle = ctx.router.tenant_handle(tenant).await?;

        let mut tx = handle.begin_transaction().await?;

        let result = ctx
            .numbering
            .next_number(&mut tx, TenantUuid::new(), DocumentType::Order, Timestamp::now())
            .await;

        assert!(
            matches!(result, Err(NumberingError::UnknownTenant)),
            "expected UnknownTenant, got {result:?}"
        );

        Ok(())
    }
}
