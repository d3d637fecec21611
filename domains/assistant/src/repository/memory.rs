//! In-memory Assistant store
//!
//! Implements every Assistant repository trait over process memory, with
//! seeding helpers for tests and the local binary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use deji_common::RepositoryError;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    address_digits, CatalogRepository, IdentityRepository, InvoiceRepository, LedgerRepository,
    ReceiptRepository,
};
use crate::domain::entities::{
    Invoice, LedgerEntry, LedgerKind, Product, INVOICE_DELIVERED, INVOICE_PENDING,
};
use crate::domain::role::SenderRole;

#[derive(Debug, Clone)]
struct UserRow {
    tenant_id: Uuid,
    phone: String,
    role: String,
}

#[derive(Debug, Default)]
struct Tables {
    tenants: HashMap<String, Uuid>,
    users: Vec<UserRow>,
    products: Vec<Product>,
    invoices: Vec<Invoice>,
    ledger: Vec<LedgerEntry>,
    receipts: HashMap<String, DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAssistantStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryAssistantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Register a tenant reachable through `channel_account_id`
    pub fn add_tenant(&self, channel_account_id: &str) -> Uuid {
        let tenant_id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .tenants
            .insert(channel_account_id.to_string(), tenant_id);
        tenant_id
    }

    pub fn add_user(&self, tenant_id: Uuid, phone: &str, role: &str) {
        self.tables.lock().unwrap().users.push(UserRow {
            tenant_id,
            phone: phone.to_string(),
            role: role.to_string(),
        });
    }

    /// Add a product with the default low-stock threshold and no currency
    pub fn add_product(&self, tenant_id: Uuid, name: &str, price: Decimal, stock: i32) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            price,
            currency: None,
            stock,
            low_stock_threshold: 5,
        };
        self.tables.lock().unwrap().products.push(product.clone());
        product
    }

    pub fn add_invoice(&self, invoice: Invoice) {
        self.tables.lock().unwrap().invoices.push(invoice);
    }

    pub fn add_ledger_entry(&self, tenant_id: Uuid, kind: LedgerKind, amount: Decimal) {
        self.tables.lock().unwrap().ledger.push(LedgerEntry {
            tenant_id,
            kind,
            amount,
        });
    }

    pub fn invoice(&self, tenant_id: Uuid, invoice_id: i64) -> Option<Invoice> {
        self.tables
            .lock()
            .unwrap()
            .invoices
            .iter()
            .find(|i| i.tenant_id == tenant_id && i.id == invoice_id)
            .cloned()
    }

    pub fn products(&self) -> Vec<Product> {
        self.tables.lock().unwrap().products.clone()
    }

    /// Record a claim as if it arrived at `received_at`
    pub fn add_receipt(&self, provider_message_id: &str, received_at: DateTime<Utc>) {
        self.tables
            .lock()
            .unwrap()
            .receipts
            .insert(provider_message_id.to_string(), received_at);
    }

    pub fn receipt_count(&self) -> usize {
        self.tables.lock().unwrap().receipts.len()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl IdentityRepository for InMemoryAssistantStore {
    async fn resolve_tenant(
        &self,
        channel_account_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .tenants
            .get(channel_account_id)
            .copied())
    }

    async fn sender_role(
        &self,
        tenant_id: Uuid,
        address: &str,
    ) -> Result<SenderRole, RepositoryError> {
        self.check_available()?;
        let digits = address_digits(address);
        if digits.is_empty() {
            return Ok(SenderRole::Customer);
        }

        let tables = self.tables.lock().unwrap();
        let roles = tables
            .users
            .iter()
            .filter(|u| u.tenant_id == tenant_id && address_digits(&u.phone) == digits)
            .map(|u| SenderRole::from_user_role(Some(&u.role)));

        let mut resolved = SenderRole::Customer;
        for role in roles {
            if role.is_privileged() {
                resolved = role;
            }
        }
        Ok(resolved)
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryAssistantStore {
    async fn find_by_name(
        &self,
        tenant_id: Uuid,
        fragment: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        self.check_available()?;
        let needle = fragment.to_lowercase();
        let tables = self.tables.lock().unwrap();

        Ok(tables
            .products
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.name.to_lowercase().contains(&needle))
            .min_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn low_stock(
        &self,
        tenant_id: Uuid,
        threshold: i32,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.check_available()?;
        let tables = self.tables.lock().unwrap();

        let mut products: Vec<Product> = tables
            .products
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.stock <= threshold)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
        Ok(products)
    }
}

#[async_trait::async_trait]
impl InvoiceRepository for InMemoryAssistantStore {
    async fn find(
        &self,
        tenant_id: Uuid,
        invoice_id: i64,
    ) -> Result<Option<Invoice>, RepositoryError> {
        self.check_available()?;
        Ok(self.invoice(tenant_id, invoice_id))
    }

    async fn deliver_all_pending(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        let mut moved = 0;

        for invoice in tables
            .invoices
            .iter_mut()
            .filter(|i| i.tenant_id == tenant_id && i.status == INVOICE_PENDING)
        {
            invoice.status = INVOICE_DELIVERED.to_string();
            moved += 1;
        }

        Ok(moved)
    }

    async fn deliver_pending(
        &self,
        tenant_id: Uuid,
        invoice_id: i64,
    ) -> Result<bool, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();

        match tables.invoices.iter_mut().find(|i| {
            i.tenant_id == tenant_id && i.id == invoice_id && i.status == INVOICE_PENDING
        }) {
            Some(invoice) => {
                invoice.status = INVOICE_DELIVERED.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl LedgerRepository for InMemoryAssistantStore {
    async fn balance(&self, tenant_id: Uuid) -> Result<Decimal, RepositoryError> {
        self.check_available()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .ledger
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .map(LedgerEntry::signed_amount)
            .sum())
    }
}

#[async_trait::async_trait]
impl ReceiptRepository for InMemoryAssistantStore {
    async fn claim(&self, provider_message_id: &str) -> Result<bool, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.receipts.contains_key(provider_message_id) {
            return Ok(false);
        }
        tables
            .receipts
            .insert(provider_message_id.to_string(), Utc::now());
        Ok(true)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.receipts.len();
        tables.receipts.retain(|_, received_at| *received_at >= cutoff);
        Ok((before - tables.receipts.len()) as u64)
    }
}
