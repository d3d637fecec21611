//! Business records read by tool handlers and admin commands
//!
//! These tables belong to the wider ERP; the assistant only reads them and
//! performs the conditional invoice status update.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INVOICE_PENDING: &str = "PENDING";
pub const INVOICE_DELIVERED: &str = "DELIVERED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub currency: Option<String>,
    pub stock: i32,
    pub low_stock_threshold: i32,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Invoice summary with its computed total and customer name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: i64,
    pub tenant_id: Uuid,
    pub number: Option<String>,
    pub customer_name: Option<String>,
    pub status: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub tenant_id: Uuid,
    pub kind: LedgerKind,
    pub amount: Decimal,
}

impl LedgerEntry {
    /// Contribution to the running balance
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            LedgerKind::Credit => self.amount,
            LedgerKind::Debit => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount() {
        let tenant_id = Uuid::new_v4();
        let credit = LedgerEntry {
            tenant_id,
            kind: LedgerKind::Credit,
            amount: Decimal::new(5000, 2),
        };
        let debit = LedgerEntry {
            tenant_id,
            kind: LedgerKind::Debit,
            amount: Decimal::new(1250, 2),
        };

        assert_eq!(
            credit.signed_amount() + debit.signed_amount(),
            Decimal::new(3750, 2)
        );
    }
}
