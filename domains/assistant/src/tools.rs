//! Structured Tool Handlers
//!
//! Answer price, availability and order-status questions from tenant data.
//! A handler that cannot answer returns `None`; the pipeline then falls
//! through to the generative responder.

use std::sync::Arc;

use deji_common::RepositoryError;
use uuid::Uuid;

use crate::domain::intent::Intent;
use crate::domain::replies;
use crate::repository::AssistantRepositories;

lazy_static::lazy_static! {
    static ref DIGIT_RUN_REGEX: regex::Regex = regex::Regex::new(r"\d+").unwrap();
}

/// Picks the product-name candidate out of a question
pub trait ProductNameExtractor: Send + Sync {
    fn extract<'a>(&self, text: &'a str) -> Option<&'a str>;
}

/// Last whitespace-delimited token.
///
/// Misses multi-word names and keeps trailing punctuation ("widget?").
#[derive(Debug, Clone, Copy, Default)]
pub struct LastTokenExtractor;

impl ProductNameExtractor for LastTokenExtractor {
    fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.split_whitespace().last()
    }
}

/// First run of digits in the text, read as an invoice id
pub fn extract_order_number(text: &str) -> Option<&str> {
    DIGIT_RUN_REGEX.find(text).map(|m| m.as_str())
}

#[derive(Clone)]
pub struct ToolHandlers {
    repos: AssistantRepositories,
    extractor: Arc<dyn ProductNameExtractor>,
}

impl ToolHandlers {
    pub fn new(repos: AssistantRepositories) -> Self {
        Self {
            repos,
            extractor: Arc::new(LastTokenExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ProductNameExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Answer for the intent, if a tool covers it and the data store responds
    pub async fn answer(&self, intent: Intent, tenant_id: Uuid, text: &str) -> Option<String> {
        let result = match intent {
            Intent::ProductPrice => self.price(tenant_id, text).await,
            Intent::ProductAvailability => self.availability(tenant_id, text).await,
            Intent::OrderStatus => self.order_status(tenant_id, text).await,
            Intent::AdminCommand | Intent::Chat => return None,
        };

        match result {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    intent = ?intent,
                    error = %e,
                    "Tool handler lookup failed; falling back"
                );
                None
            }
        }
    }

    async fn price(&self, tenant_id: Uuid, text: &str) -> Result<String, RepositoryError> {
        let Some(candidate) = self.extractor.extract(text) else {
            return Ok(replies::PRICE_PRODUCT_NOT_FOUND.to_string());
        };

        Ok(
            match self.repos.catalog.find_by_name(tenant_id, candidate).await? {
                Some(product) => replies::product_price(&product),
                None => replies::PRICE_PRODUCT_NOT_FOUND.to_string(),
            },
        )
    }

    async fn availability(&self, tenant_id: Uuid, text: &str) -> Result<String, RepositoryError> {
        let Some(candidate) = self.extractor.extract(text) else {
            return Ok(replies::AVAILABILITY_PRODUCT_NOT_FOUND.to_string());
        };

        Ok(
            match self.repos.catalog.find_by_name(tenant_id, candidate).await? {
                Some(product) => replies::product_availability(&product),
                None => replies::AVAILABILITY_PRODUCT_NOT_FOUND.to_string(),
            },
        )
    }

    async fn order_status(&self, tenant_id: Uuid, text: &str) -> Result<String, RepositoryError> {
        let Some(number) = extract_order_number(text) else {
            return Ok(replies::ORDER_NUMBER_MISSING.to_string());
        };

        let Ok(invoice_id) = number.parse::<i64>() else {
            return Ok(replies::ORDER_NOT_FOUND.to_string());
        };

        Ok(match self.repos.invoices.find(tenant_id, invoice_id).await? {
            Some(invoice) => replies::order_status(&invoice),
            None => replies::ORDER_NOT_FOUND.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Invoice;
    use crate::repository::InMemoryAssistantStore;
    use rust_decimal::Decimal;

    fn setup() -> (InMemoryAssistantStore, Uuid, ToolHandlers) {
        let store = InMemoryAssistantStore::new();
        let tenant = store.add_tenant("acct");
        let tools = ToolHandlers::new(AssistantRepositories::in_memory(store.clone()));
        (store, tenant, tools)
    }

    #[test]
    fn test_last_token_extractor() {
        assert_eq!(LastTokenExtractor.extract("how much is widget"), Some("widget"));
        assert_eq!(LastTokenExtractor.extract("   "), None);
    }

    #[test]
    fn test_extract_order_number() {
        assert_eq!(extract_order_number("order 1042 status"), Some("1042"));
        assert_eq!(extract_order_number("track my order"), None);
    }

    #[tokio::test]
    async fn test_price_answer() {
        let (store, tenant, tools) = setup();
        store.add_product(tenant, "Widget", Decimal::new(1500, 0), 10);

        assert_eq!(
            tools
                .answer(Intent::ProductPrice, tenant, "how much is widget")
                .await
                .as_deref(),
            Some("Widget costs 1500 ₦")
        );
        assert_eq!(
            tools
                .answer(Intent::ProductPrice, tenant, "how much is gizmo")
                .await
                .as_deref(),
            Some(replies::PRICE_PRODUCT_NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_availability_answer() {
        let (store, tenant, tools) = setup();
        store.add_product(tenant, "Rice", Decimal::ONE, 0);

        assert_eq!(
            tools
                .answer(Intent::ProductAvailability, tenant, "is rice available")
                .await
                .as_deref(),
            Some(replies::AVAILABILITY_PRODUCT_NOT_FOUND)
        );
        assert_eq!(
            tools
                .answer(Intent::ProductAvailability, tenant, "available rice")
                .await
                .as_deref(),
            Some("Rice is currently out of stock")
        );
    }

    #[tokio::test]
    async fn test_order_status_answer() {
        let (store, tenant, tools) = setup();
        store.add_invoice(Invoice {
            id: 42,
            tenant_id: tenant,
            number: None,
            customer_name: None,
            status: "PENDING".to_string(),
            total: Decimal::ZERO,
        });

        assert_eq!(
            tools
                .answer(Intent::OrderStatus, tenant, "order 42 status")
                .await
                .as_deref(),
            Some("Order #42 is currently PENDING")
        );
        assert_eq!(
            tools
                .answer(Intent::OrderStatus, tenant, "order 7 status")
                .await
                .as_deref(),
            Some(replies::ORDER_NOT_FOUND)
        );
        assert_eq!(
            tools
                .answer(Intent::OrderStatus, tenant, "track my order")
                .await
                .as_deref(),
            Some(replies::ORDER_NUMBER_MISSING)
        );
    }

    #[tokio::test]
    async fn test_store_failure_yields_none() {
        let (store, tenant, tools) = setup();
        store.set_unavailable(true);

        assert!(tools
            .answer(Intent::ProductPrice, tenant, "price of widget")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_chat_has_no_tool() {
        let (_store, tenant, tools) = setup();
        assert!(tools.answer(Intent::Chat, tenant, "hello").await.is_none());
    }

    struct FirstTokenExtractor;

    impl ProductNameExtractor for FirstTokenExtractor {
        fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
            text.split_whitespace().next()
        }
    }

    #[tokio::test]
    async fn test_swappable_extractor() {
        let (store, tenant, tools) = setup();
        store.add_product(tenant, "Widget", Decimal::new(1500, 0), 10);
        let tools = tools.with_extractor(Arc::new(FirstTokenExtractor));

        assert_eq!(
            tools
                .answer(Intent::ProductPrice, tenant, "widget price please")
                .await
                .as_deref(),
            Some("Widget costs 1500 ₦")
        );
    }
}
