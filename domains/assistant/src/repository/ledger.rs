//! Ledger balance query

use deji_common::RepositoryError;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::LedgerRepository;

#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn balance(&self, tenant_id: Uuid) -> Result<Decimal, RepositoryError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(
                SUM(CASE WHEN kind = 'CREDIT' THEN amount ELSE -amount END),
                0
            )
            FROM ledger_entries
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }
}
