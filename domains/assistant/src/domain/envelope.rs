//! Inbound message envelope
//!
//! The provider-neutral view of one inbound message. Built from the webhook
//! payload and handed to the pipeline; never persisted.

use chrono::{DateTime, TimeZone, Utc};
use deji_whatsapp::webhook::{MessageUnit, WebhookPayload};
use serde::{Deserialize, Serialize};

/// What the sender sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageKind {
    Text {
        body: String,
    },
    /// `media_id` is empty when the provider sent no media reference
    Audio {
        media_id: String,
        mime_type: Option<String>,
    },
    /// Anything else; carries the provider's type tag
    Unsupported {
        type_tag: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    /// Provider message id, used for redelivery deduplication
    pub provider_message_id: Option<String>,
    /// Business phone-number id the message was addressed to; identifies the tenant
    pub channel_account_id: String,
    /// Sender channel address
    pub sender: String,
    pub kind: MessageKind,
    pub received_at: DateTime<Utc>,
}

impl InboundEnvelope {
    /// Build an envelope from one webhook message.
    ///
    /// Returns `None` when the sender or the addressed account is missing.
    pub fn from_unit(unit: &MessageUnit<'_>) -> Option<Self> {
        let message = unit.message;
        let channel_account_id = unit.phone_number_id.filter(|id| !id.is_empty())?;
        let sender = message.from.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

        let kind = match message.message_type.as_str() {
            "text" => MessageKind::Text {
                body: message
                    .text
                    .as_ref()
                    .map(|t| t.body.clone())
                    .unwrap_or_default(),
            },
            "audio" => {
                let audio = message.audio.as_ref();
                MessageKind::Audio {
                    media_id: audio.and_then(|a| a.id.clone()).unwrap_or_default(),
                    mime_type: audio.and_then(|a| a.mime_type.clone()),
                }
            }
            other => MessageKind::Unsupported {
                type_tag: other.to_string(),
            },
        };

        let received_at = message
            .timestamp
            .as_deref()
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now);

        Some(Self {
            provider_message_id: message.id.clone(),
            channel_account_id: channel_account_id.to_string(),
            sender: sender.to_string(),
            kind,
            received_at,
        })
    }

    /// Envelope for the first message unit of a webhook delivery
    pub fn first_in(payload: &WebhookPayload) -> Option<Self> {
        let mut units = payload.message_units();
        let first = units.next()?;

        let skipped = units.count();
        if skipped > 0 {
            tracing::debug!(skipped, "Webhook carried more than one message; using the first");
        }

        Self::from_unit(&first)
    }
}
