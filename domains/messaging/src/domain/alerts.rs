//! Low-stock alert content

use serde::Deserialize;

/// Notification category for low-stock alerts
pub const LOW_STOCK_ALERT: &str = "LOW_STOCK_ALERT";

/// Product snapshot included in a low-stock alert
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LowStockItem {
    pub name: String,
    pub stock: i32,
    pub low_stock_threshold: i32,
}

/// Alert text for a set of products, one block per product.
///
/// Returns `None` when there is nothing to report.
pub fn compose_low_stock_alert(items: &[LowStockItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let blocks = items
        .iter()
        .map(|item| {
            format!(
                "🔔 Low Stock Alert:\nProduct: {}\nStock Left: {}\nThreshold: {}",
                item.name, item.stock, item.low_stock_threshold
            )
        })
        .collect::<Vec<_>>();

    Some(blocks.join("\n\n"))
}
