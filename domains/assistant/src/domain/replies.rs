//! Fixed reply texts and reply formatting

use rust_decimal::Decimal;

use super::entities::{Invoice, Product};

/// System persona for the generative responder
pub const ASSISTANT_PERSONA: &str = "You are a helpful ERP assistant for SMEs on WhatsApp. \
Answer briefly and politely. If the question is about prices, stock or orders and you \
do not have the data, ask the customer for the product name or order number.";

pub const TRANSCRIPTION_FAILED: &str = "⚠️ Could not transcribe your voice note.";
pub const UNSUPPORTED_MESSAGE: &str = "🤖 I can handle text and voice notes for now.";
pub const NOT_UNDERSTOOD: &str = "🤖 Sorry, I didn't catch that.";
pub const COMMAND_FAILED: &str = "⚠️ Could not complete that command right now.";
pub const COMMAND_NOT_PREVIEWED: &str =
    "🧪 Preview only: this command changes data or sends messages and was not run.";

pub const PRICE_PRODUCT_NOT_FOUND: &str = "I couldn't find that product.";
pub const AVAILABILITY_PRODUCT_NOT_FOUND: &str = "Not sure, product not found.";
pub const ORDER_NUMBER_MISSING: &str = "Please provide your order number.";
pub const ORDER_NOT_FOUND: &str = "Order not found.";
pub const NO_LOW_STOCK: &str = "✅ No low-stock items.";

const DEFAULT_CURRENCY: &str = "₦";

pub fn product_price(product: &Product) -> String {
    format!(
        "{} costs {} {}",
        product.name,
        product.price.normalize(),
        product.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    )
}

pub fn product_availability(product: &Product) -> String {
    if product.in_stock() {
        format!("{} is in stock ({} left)", product.name, product.stock)
    } else {
        format!("{} is currently out of stock", product.name)
    }
}

pub fn order_status(invoice: &Invoice) -> String {
    format!("Order #{} is currently {}", invoice.id, invoice.status)
}

pub fn delivered_all(count: u64) -> String {
    format!("✅ Marked {} pending invoice(s) as DELIVERED.", count)
}

pub fn delivered_one(invoice_id: i64, updated: bool) -> String {
    if updated {
        format!("✅ Invoice {} marked as DELIVERED.", invoice_id)
    } else {
        format!("⚠️ Invoice {} not found or already delivered.", invoice_id)
    }
}

pub fn low_stock_list(threshold: i32, products: &[Product]) -> String {
    if products.is_empty() {
        return NO_LOW_STOCK.to_string();
    }

    let lines: Vec<String> = products
        .iter()
        .map(|p| format!("• {} — {}", p.name, p.stock))
        .collect();

    format!("📉 Low-stock (≤{})\n{}", threshold, lines.join("\n"))
}

/// Short invoice summary dispatched by `#invoice <id> send`
pub fn invoice_summary(invoice: &Invoice) -> String {
    format!(
        "🧾 Invoice {}\nCustomer: {}\nTotal: {}\nStatus: {}",
        invoice
            .number
            .clone()
            .unwrap_or_else(|| invoice.id.to_string()),
        invoice.customer_name.as_deref().unwrap_or("-"),
        invoice.total.normalize(),
        invoice.status
    )
}

pub fn invoice_not_found(invoice_id: i64) -> String {
    format!("⚠️ Invoice {} not found.", invoice_id)
}

pub fn invoice_sent(invoice_id: i64, address: &str) -> String {
    format!("✅ Invoice {} sent to {}.", invoice_id, address)
}

pub fn invoice_send_failed(invoice_id: i64, address: &str) -> String {
    format!("⚠️ Could not send invoice {} to {}.", invoice_id, address)
}

pub fn ledger_balance(balance: Decimal) -> String {
    format!("📊 Ledger balance: {}", balance.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn product(name: &str, price: Decimal, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            currency: None,
            stock,
            low_stock_threshold: 5,
        }
    }

    #[test]
    fn test_price_reply_drops_trailing_zeros() {
        let widget = product("Widget", Decimal::new(150000, 2), 4);
        assert_eq!(product_price(&widget), "Widget costs 1500 ₦");

        let priced_in_usd = Product {
            currency: Some("USD".to_string()),
            ..product("Gadget", Decimal::new(1999, 2), 1)
        };
        assert_eq!(product_price(&priced_in_usd), "Gadget costs 19.99 USD");
    }

    #[test]
    fn test_availability_reply() {
        assert_eq!(
            product_availability(&product("Rice", Decimal::ONE, 3)),
            "Rice is in stock (3 left)"
        );
        assert_eq!(
            product_availability(&product("Rice", Decimal::ONE, 0)),
            "Rice is currently out of stock"
        );
    }

    #[test]
    fn test_low_stock_list() {
        let items = vec![
            product("Beans", Decimal::ONE, 3),
            product("Rice", Decimal::ONE, 8),
        ];
        assert_eq!(
            low_stock_list(10, &items),
            "📉 Low-stock (≤10)\n• Beans — 3\n• Rice — 8"
        );
        assert_eq!(low_stock_list(0, &[]), NO_LOW_STOCK);
    }

    #[test]
    fn test_invoice_summary() {
        let invoice = Invoice {
            id: 12,
            tenant_id: Uuid::new_v4(),
            number: None,
            customer_name: Some("Ada".to_string()),
            status: "PENDING".to_string(),
            total: Decimal::new(250050, 2),
        };
        assert_eq!(
            invoice_summary(&invoice),
            "🧾 Invoice 12\nCustomer: Ada\nTotal: 2500.5\nStatus: PENDING"
        );
    }
}
