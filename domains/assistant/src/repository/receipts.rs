//! Inbound receipt claims

use chrono::{DateTime, Utc};
use deji_common::RepositoryError;
use sqlx::PgPool;

use super::ReceiptRepository;

#[derive(Clone)]
pub struct PgReceiptRepository {
    pool: PgPool,
}

impl PgReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReceiptRepository for PgReceiptRepository {
    async fn claim(&self, provider_message_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO inbound_receipts (provider_message_id, received_at)
            VALUES ($1, NOW())
            ON CONFLICT (provider_message_id) DO NOTHING
            "#,
        )
        .bind(provider_message_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM inbound_receipts WHERE received_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
