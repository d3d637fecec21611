//! Outbound Sender
//!
//! Delivers text over a channel and writes exactly one `DeliveryRecord` per
//! call. Channel failures and timeouts become `FAILED` records; nothing is
//! returned as an error and nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use deji_email::EmailService;
use deji_whatsapp::MessagingService;
use uuid::Uuid;

use crate::domain::entities::{DeliveryChannel, DeliveryRecord};
use crate::repository::DeliveryLog;

/// Category used for conversational replies
pub const CHAT_REPLY: &str = "chat_reply";
/// Category used for invoice summaries dispatched by staff
pub const INVOICE_DISPATCH: &str = "invoice_dispatch";

/// A single outbound message
#[derive(Debug, Clone)]
pub struct Outbound<'a> {
    pub tenant_id: Uuid,
    pub channel: DeliveryChannel,
    pub category: &'a str,
    pub recipient: &'a str,
    pub body: &'a str,
}

pub struct OutboundSender {
    messaging: Arc<dyn MessagingService>,
    email: Arc<dyn EmailService>,
    log: Arc<dyn DeliveryLog>,
    timeout: Duration,
}

impl OutboundSender {
    pub fn new(
        messaging: Arc<dyn MessagingService>,
        email: Arc<dyn EmailService>,
        log: Arc<dyn DeliveryLog>,
        timeout: Duration,
    ) -> Self {
        Self {
            messaging,
            email,
            log,
            timeout,
        }
    }

    /// Send a plain-text message over the messaging channel
    pub async fn send_text(
        &self,
        tenant_id: Uuid,
        category: &str,
        to: &str,
        body: &str,
    ) -> DeliveryRecord {
        self.deliver(Outbound {
            tenant_id,
            channel: DeliveryChannel::Whatsapp,
            category,
            recipient: to,
            body,
        })
        .await
    }

    /// Attempt delivery and persist the outcome
    pub async fn deliver(&self, outbound: Outbound<'_>) -> DeliveryRecord {
        let Outbound {
            tenant_id,
            channel,
            category,
            recipient,
            body,
        } = outbound;

        let outcome = match channel {
            DeliveryChannel::Whatsapp => {
                match tokio::time::timeout(self.timeout, self.messaging.send_text(recipient, body))
                    .await
                {
                    Ok(Ok(receipt)) => Ok(receipt.message_id),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("send timed out after {:?}", self.timeout)),
                }
            }
            DeliveryChannel::Email => {
                match tokio::time::timeout(
                    self.timeout,
                    self.email.send_notification(recipient, category, body),
                )
                .await
                {
                    Ok(Ok(receipt)) => Ok(Some(receipt.message_id)),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("send timed out after {:?}", self.timeout)),
                }
            }
        };

        let record = match outcome {
            Ok(provider_message_id) => {
                tracing::info!(
                    tenant_id = %tenant_id,
                    channel = %channel,
                    category = %category,
                    provider_message_id = ?provider_message_id,
                    "Outbound message sent"
                );
                DeliveryRecord::sent(
                    tenant_id,
                    channel,
                    category,
                    recipient,
                    body,
                    provider_message_id,
                )
            }
            Err(error) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    channel = %channel,
                    category = %category,
                    error = %error,
                    "Outbound message failed"
                );
                DeliveryRecord::failed(tenant_id, channel, category, recipient, body, error)
            }
        };

        // Status callbacks that beat this write are held by the log and applied by `record`
        if let Err(e) = self.log.record(&record).await {
            tracing::error!(
                record_id = %record.id,
                error = %e,
                "Failed to persist delivery record"
            );
        }

        record
    }
}
