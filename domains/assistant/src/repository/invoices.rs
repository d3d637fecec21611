//! Invoice queries and conditional delivery updates

use deji_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::InvoiceRepository;
use crate::domain::entities::{Invoice, INVOICE_DELIVERED, INVOICE_PENDING};

#[derive(Clone)]
pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    async fn find(
        &self,
        tenant_id: Uuid,
        invoice_id: i64,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT i.id,
                   i.tenant_id,
                   i.number,
                   c.name AS customer_name,
                   i.status,
                   COALESCE(
                       (SELECT SUM(it.total) FROM invoice_items it WHERE it.invoice_id = i.id),
                       0
                   ) AS total
            FROM invoices i
            LEFT JOIN contacts c ON c.id = i.contact_id
            WHERE i.tenant_id = $1
              AND i.id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn deliver_all_pending(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1
              AND status = $2
            "#,
        )
        .bind(tenant_id)
        .bind(INVOICE_PENDING)
        .bind(INVOICE_DELIVERED)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn deliver_pending(
        &self,
        tenant_id: Uuid,
        invoice_id: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $4, updated_at = NOW()
            WHERE tenant_id = $1
              AND id = $2
              AND status = $3
            "#,
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .bind(INVOICE_PENDING)
        .bind(INVOICE_DELIVERED)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
