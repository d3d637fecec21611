//! Notification preference repository

use deji_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::PreferenceRepository;
use crate::domain::entities::NotificationPreference;

#[derive(Clone)]
pub struct PgPreferenceRepository {
    pool: PgPool,
}

impl PgPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    async fn find(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<NotificationPreference>, RepositoryError> {
        let preference = sqlx::query_as::<_, NotificationPreference>(
            r#"
            SELECT tenant_id, notify_by_email, notify_by_whatsapp
            FROM notification_preferences
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preference)
    }

    async fn upsert(
        &self,
        preference: &NotificationPreference,
    ) -> Result<NotificationPreference, RepositoryError> {
        let saved = sqlx::query_as::<_, NotificationPreference>(
            r#"
            INSERT INTO notification_preferences (tenant_id, notify_by_email, notify_by_whatsapp)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id) DO UPDATE
            SET notify_by_email = EXCLUDED.notify_by_email,
                notify_by_whatsapp = EXCLUDED.notify_by_whatsapp,
                updated_at = NOW()
            RETURNING tenant_id, notify_by_email, notify_by_whatsapp
            "#,
        )
        .bind(preference.tenant_id)
        .bind(preference.notify_by_email)
        .bind(preference.notify_by_whatsapp)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
