//! Tenant and sender resolution against the ERP's tenant and user tables

use deji_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::{address_digits, IdentityRepository};
use crate::domain::role::SenderRole;

#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn resolve_tenant(
        &self,
        channel_account_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError> {
        let tenant_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM tenants
            WHERE whatsapp_phone_number_id = $1
            "#,
        )
        .bind(channel_account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant_id)
    }

    async fn sender_role(
        &self,
        tenant_id: Uuid,
        address: &str,
    ) -> Result<SenderRole, RepositoryError> {
        let digits = address_digits(address);
        if digits.is_empty() {
            return Ok(SenderRole::Customer);
        }

        let role = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM users
            WHERE tenant_id = $1
              AND regexp_replace(phone, '[^0-9]', '', 'g') = $2
            ORDER BY CASE WHEN role IN ('admin', 'staff') THEN 0 ELSE 1 END
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(&digits)
        .fetch_optional(&self.pool)
        .await?;

        Ok(SenderRole::from_user_role(role.as_deref()))
    }
}
