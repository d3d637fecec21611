//! Intent classification
//!
//! A pure function of the text: case-insensitive, ordered predicates, first
//! match wins.

use serde::Serialize;

/// Marker that prefixes admin commands
pub const COMMAND_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    ProductPrice,
    ProductAvailability,
    OrderStatus,
    AdminCommand,
    Chat,
}

const PRICE_TERMS: &[&str] = &["price", "cost", "how much"];
const AVAILABILITY_TERMS: &[&str] = &["available", "in stock", "stock"];
const ORDER_QUALIFIERS: &[&str] = &["status", "track"];

pub fn classify(text: &str) -> Intent {
    let lower = text.trim().to_lowercase();
    let mentions_any = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));

    if mentions_any(PRICE_TERMS) {
        Intent::ProductPrice
    } else if mentions_any(AVAILABILITY_TERMS) {
        Intent::ProductAvailability
    } else if lower.contains("order") && mentions_any(ORDER_QUALIFIERS) {
        Intent::OrderStatus
    } else if is_command(&lower) {
        Intent::AdminCommand
    } else {
        Intent::Chat
    }
}

/// Whether the text carries the command marker
pub fn is_command(text: &str) -> bool {
    text.trim_start().starts_with(COMMAND_MARKER)
}
