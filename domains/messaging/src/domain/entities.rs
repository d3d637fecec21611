//! Domain entities for the Messaging domain
//!
//! Delivery records are written once per outbound attempt and afterwards only
//! mutated by provider status callbacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outbound delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_channel", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Whatsapp,
    Email,
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryChannel::Whatsapp => write!(f, "whatsapp"),
            DeliveryChannel::Email => write!(f, "email"),
        }
    }
}

/// Delivery status of an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Map a provider status callback value (`delivered`, `read`, ...) to a status
    pub fn from_provider(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sent" => Some(DeliveryStatus::Sent),
            "delivered" => Some(DeliveryStatus::Delivered),
            "read" => Some(DeliveryStatus::Read),
            "failed" => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }

    /// Statuses a record may be in for a callback to move it to `self`.
    ///
    /// Callbacks can arrive out of order; a record never moves backwards
    /// (a late `delivered` does not overwrite `READ`).
    pub fn reachable_from(self) -> &'static [DeliveryStatus] {
        match self {
            DeliveryStatus::Sent => &[],
            DeliveryStatus::Delivered => &[DeliveryStatus::Sent],
            DeliveryStatus::Read => &[DeliveryStatus::Sent, DeliveryStatus::Delivered],
            DeliveryStatus::Failed => &[DeliveryStatus::Sent],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Read => "READ",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound delivery attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub channel: DeliveryChannel,
    /// e.g. `chat_reply`, `invoice_dispatch`, `LOW_STOCK_ALERT`
    pub category: String,
    pub recipient: String,
    pub body: String,
    pub provider_message_id: Option<String>,
    pub status: DeliveryStatus,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl DeliveryRecord {
    /// Record of a successful send
    pub fn sent(
        tenant_id: Uuid,
        channel: DeliveryChannel,
        category: &str,
        recipient: &str,
        body: &str,
        provider_message_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            channel,
            category: category.to_string(),
            recipient: recipient.to_string(),
            body: body.to_string(),
            provider_message_id,
            status: DeliveryStatus::Sent,
            error_detail: None,
            created_at: now,
            sent_at: Some(now),
        }
    }

    /// Record of a failed send; `sent_at` stays empty
    pub fn failed(
        tenant_id: Uuid,
        channel: DeliveryChannel,
        category: &str,
        recipient: &str,
        body: &str,
        error_detail: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            channel,
            category: category.to_string(),
            recipient: recipient.to_string(),
            body: body.to_string(),
            provider_message_id: None,
            status: DeliveryStatus::Failed,
            error_detail: Some(error_detail),
            created_at: Utc::now(),
            sent_at: None,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status != DeliveryStatus::Failed
    }
}

/// Per-tenant notification channel choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationPreference {
    pub tenant_id: Uuid,
    pub notify_by_email: bool,
    pub notify_by_whatsapp: bool,
}

lazy_static::lazy_static! {
    /// Messaging-channel address: digits with an optional leading `+`
    static ref PHONE_ADDRESS_REGEX: regex::Regex =
        regex::Regex::new(r"^\+?[0-9]+$").unwrap();
}

/// Channel implied by the shape of a recipient address
pub fn channel_for_address(address: &str) -> Option<DeliveryChannel> {
    let address = address.trim();
    if address.contains('@') {
        Some(DeliveryChannel::Email)
    } else if PHONE_ADDRESS_REGEX.is_match(address) {
        Some(DeliveryChannel::Whatsapp)
    } else {
        None
    }
}

/// Filter for listing delivery records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryFilter {
    pub channel: Option<DeliveryChannel>,
    pub category: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub recipient: Option<String>,
}

impl DeliveryFilter {
    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        self.channel.is_none_or(|c| c == record.channel)
            && self
                .category
                .as_deref()
                .is_none_or(|c| c == record.category)
            && self.status.is_none_or(|s| s == record.status)
            && self
                .recipient
                .as_deref()
                .is_none_or(|r| r == record.recipient)
    }
}
