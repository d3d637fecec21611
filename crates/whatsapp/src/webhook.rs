//! WhatsApp webhook payloads and signature verification.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verify the webhook signature sent as `sha256=<hex>` over the raw body.
pub fn verify_signature(body: &[u8], signature_header: &str, app_secret: &str) -> bool {
    let Some(expected_hex) = signature_header.strip_prefix("sha256=") else {
        tracing::warn!("Invalid signature header format (missing sha256= prefix)");
        return false;
    };

    let Ok(expected) = hex::decode(expected_hex) else {
        tracing::warn!("Signature header is not valid hex");
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);

    // verify_slice compares in constant time
    mac.verify_slice(&expected).is_ok()
}

/// Top-level webhook delivery
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub metadata: Option<ChangeMetadata>,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub statuses: Vec<StatusUpdate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeMetadata {
    pub phone_number_id: String,
    #[serde(default)]
    pub display_phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub audio: Option<MediaContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Asynchronous delivery-status callback for a previously sent message
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub errors: Vec<StatusError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

impl StatusUpdate {
    /// First error title, if the provider reported one
    pub fn error_detail(&self) -> Option<String> {
        self.errors.first().map(|e| match (&e.code, &e.title) {
            (Some(code), Some(title)) => format!("{}: {}", code, title),
            (None, Some(title)) => title.clone(),
            (Some(code), None) => code.to_string(),
            (None, None) => "unknown error".to_string(),
        })
    }
}

/// A message together with the business phone-number id it was addressed to
#[derive(Debug, Clone)]
pub struct MessageUnit<'a> {
    pub phone_number_id: Option<&'a str>,
    pub message: &'a InboundMessage,
}

impl WebhookPayload {
    fn values(&self) -> impl Iterator<Item = &ChangeValue> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .filter_map(|c| c.value.as_ref())
    }

    /// Every inbound message, in delivery order
    pub fn message_units(&self) -> impl Iterator<Item = MessageUnit<'_>> {
        self.values().flat_map(|value| {
            let phone_number_id = value.metadata.as_ref().map(|m| m.phone_number_id.as_str());
            value.messages.iter().map(move |message| MessageUnit {
                phone_number_id,
                message,
            })
        })
    }

    /// Every delivery-status update, in delivery order
    pub fn status_updates(&self) -> impl Iterator<Item = &StatusUpdate> {
        self.values().flat_map(|value| value.statuses.iter())
    }
}
