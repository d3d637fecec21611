//! Delivery record repository

use deji_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::{early_status_cutoff, DeliveryLog};
use crate::domain::entities::{DeliveryFilter, DeliveryRecord, DeliveryStatus};

#[derive(Clone)]
pub struct PgDeliveryLog {
    pool: PgPool,
}

impl PgDeliveryLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Forward-only status update of existing records
    async fn advance(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        error_detail: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let from = reachable_from(status);
        if from.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE delivery_records
            SET status = $2,
                error_detail = COALESCE($3, error_detail)
            WHERE provider_message_id = $1
              AND status::text = ANY($4)
            "#,
        )
        .bind(provider_message_id)
        .bind(status)
        .bind(error_detail)
        .bind(&from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Hold a callback until its record exists, keeping the furthest status
    async fn park(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        error_detail: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM early_delivery_statuses WHERE received_at < $1")
            .bind(early_status_cutoff())
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO early_delivery_statuses (provider_message_id, status, error_detail, received_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (provider_message_id) DO UPDATE
            SET status = EXCLUDED.status,
                error_detail = COALESCE(EXCLUDED.error_detail, early_delivery_statuses.error_detail),
                received_at = EXCLUDED.received_at
            WHERE early_delivery_statuses.status::text = ANY($4)
            "#,
        )
        .bind(provider_message_id)
        .bind(status)
        .bind(error_detail)
        .bind(reachable_from(status))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take_parked(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<(DeliveryStatus, Option<String>)>, RepositoryError> {
        let parked = sqlx::query_as::<_, (DeliveryStatus, Option<String>)>(
            r#"
            DELETE FROM early_delivery_statuses
            WHERE provider_message_id = $1
            RETURNING status, error_detail
            "#,
        )
        .bind(provider_message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(parked)
    }
}

fn reachable_from(status: DeliveryStatus) -> Vec<String> {
    status
        .reachable_from()
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

#[async_trait::async_trait]
impl DeliveryLog for PgDeliveryLog {
    async fn record(&self, record: &DeliveryRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO delivery_records (
                id, tenant_id, channel, category, recipient, body,
                provider_message_id, status, error_detail, created_at, sent_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.tenant_id)
        .bind(record.channel)
        .bind(&record.category)
        .bind(&record.recipient)
        .bind(&record.body)
        .bind(&record.provider_message_id)
        .bind(record.status)
        .bind(&record.error_detail)
        .bind(record.created_at)
        .bind(record.sent_at)
        .execute(&self.pool)
        .await?;

        if let Some(provider_message_id) = record.provider_message_id.as_deref() {
            if let Some((status, error_detail)) = self.take_parked(provider_message_id).await? {
                tracing::debug!(
                    provider_message_id = %provider_message_id,
                    status = %status,
                    "Applying status that arrived before its record"
                );
                self.advance(provider_message_id, status, error_detail.as_deref())
                    .await?;
            }
        }

        Ok(())
    }

    async fn apply_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        error_detail: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        if status.reachable_from().is_empty() {
            return Ok(0);
        }

        let changed = self
            .advance(provider_message_id, status, error_detail)
            .await?;
        if changed > 0 {
            return Ok(changed);
        }

        // A record committed after the first update cannot see this park
        self.park(provider_message_id, status, error_detail).await?;
        let changed = self
            .advance(provider_message_id, status, error_detail)
            .await?;
        if changed > 0 {
            self.take_parked(provider_message_id).await?;
        }

        Ok(changed)
    }

    async fn list_for_tenant(
        &self,
        tenant_id: Uuid,
        filter: &DeliveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeliveryRecord>, RepositoryError> {
        let records = sqlx::query_as::<_, DeliveryRecord>(
            r#"
            SELECT id, tenant_id, channel, category, recipient, body,
                   provider_message_id, status, error_detail, created_at, sent_at
            FROM delivery_records
            WHERE tenant_id = $1
              AND ($2::delivery_channel IS NULL OR channel = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::delivery_status IS NULL OR status = $4)
              AND ($5::text IS NULL OR recipient = $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(tenant_id)
        .bind(filter.channel)
        .bind(&filter.category)
        .bind(filter.status)
        .bind(&filter.recipient)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
