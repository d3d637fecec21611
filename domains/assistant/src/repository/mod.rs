//! Repository traits and implementations for the Assistant domain
//!
//! Every query is scoped by tenant. Conditional updates are single SQL
//! statements so concurrent commands against the same invoice stay atomic.

pub mod catalog;
pub mod identity;
pub mod invoices;
pub mod ledger;
pub mod memory;
pub mod receipts;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use deji_common::RepositoryError;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Invoice, Product};
use crate::domain::role::SenderRole;

pub use catalog::PgCatalogRepository;
pub use identity::PgIdentityRepository;
pub use invoices::PgInvoiceRepository;
pub use ledger::PgLedgerRepository;
pub use memory::InMemoryAssistantStore;
pub use receipts::PgReceiptRepository;

/// Tenant and sender resolution
#[async_trait::async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Tenant owning the business channel account, if any
    async fn resolve_tenant(&self, channel_account_id: &str)
        -> Result<Option<Uuid>, RepositoryError>;

    /// Role of `address` within the tenant; unknown senders are customers.
    ///
    /// Addresses are compared by their digits only.
    async fn sender_role(&self, tenant_id: Uuid, address: &str)
        -> Result<SenderRole, RepositoryError>;
}

#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    /// First product whose name contains `fragment`, case-insensitively
    async fn find_by_name(
        &self,
        tenant_id: Uuid,
        fragment: &str,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Products with stock at or below `threshold`, lowest stock first
    async fn low_stock(&self, tenant_id: Uuid, threshold: i32)
        -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait::async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find(&self, tenant_id: Uuid, invoice_id: i64)
        -> Result<Option<Invoice>, RepositoryError>;

    /// Move every `PENDING` invoice to `DELIVERED`; returns the count moved
    async fn deliver_all_pending(&self, tenant_id: Uuid) -> Result<u64, RepositoryError>;

    /// Move one invoice from `PENDING` to `DELIVERED`; false if nothing moved
    async fn deliver_pending(&self, tenant_id: Uuid, invoice_id: i64)
        -> Result<bool, RepositoryError>;
}

#[async_trait::async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Credits minus debits
    async fn balance(&self, tenant_id: Uuid) -> Result<Decimal, RepositoryError>;
}

/// Redelivery guard for inbound messages
#[async_trait::async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Claim a provider message id. True on first claim, false when already seen.
    async fn claim(&self, provider_message_id: &str) -> Result<bool, RepositoryError>;

    /// Forget claims received before `cutoff`; returns how many were removed
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Combined repository access for the Assistant domain
#[derive(Clone)]
pub struct AssistantRepositories {
    pub identity: Arc<dyn IdentityRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub receipts: Arc<dyn ReceiptRepository>,
}

impl AssistantRepositories {
    /// PostgreSQL-backed repositories
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            identity: Arc::new(PgIdentityRepository::new(pool.clone())),
            catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
            invoices: Arc::new(PgInvoiceRepository::new(pool.clone())),
            ledger: Arc::new(PgLedgerRepository::new(pool.clone())),
            receipts: Arc::new(PgReceiptRepository::new(pool)),
        }
    }

    /// Repositories sharing one in-memory store
    pub fn in_memory(store: InMemoryAssistantStore) -> Self {
        let store = Arc::new(store);
        Self {
            identity: store.clone(),
            catalog: store.clone(),
            invoices: store.clone(),
            ledger: store.clone(),
            receipts: store,
        }
    }
}

/// Keep only the digits of a channel address
pub(crate) fn address_digits(address: &str) -> String {
    address.chars().filter(char::is_ascii_digit).collect()
}
