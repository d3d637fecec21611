//! Product catalog queries

use deji_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::CatalogRepository;
use crate::domain::entities::Product;

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so the fragment matches literally
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait::async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn find_by_name(
        &self,
        tenant_id: Uuid,
        fragment: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, price, currency, stock, low_stock_threshold
            FROM products
            WHERE tenant_id = $1
              AND name ILIKE '%' || $2 || '%'
            ORDER BY name ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(escape_like(fragment))
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn low_stock(
        &self,
        tenant_id: Uuid,
        threshold: i32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, price, currency, stock, low_stock_threshold
            FROM products
            WHERE tenant_id = $1
              AND stock <= $2
            ORDER BY stock ASC, name ASC
            "#,
        )
        .bind(tenant_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
