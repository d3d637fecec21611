//! Notification Fan-out
//!
//! Delivers a business-event notification over every channel the tenant has
//! enabled and the recipient address fits. Each channel attempt is
//! independent and produces its own delivery record.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::alerts::{compose_low_stock_alert, LowStockItem, LOW_STOCK_ALERT};
use crate::domain::entities::{channel_for_address, DeliveryChannel, DeliveryRecord};
use crate::repository::PreferenceRepository;
use crate::sender::{Outbound, OutboundSender};

/// A notification addressed to one recipient
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub tenant_id: Uuid,
    /// e.g. `LOW_STOCK_ALERT`
    pub category: String,
    /// Email address or phone number
    pub recipient: String,
    pub content: String,
}

pub struct NotificationFanout {
    preferences: Arc<dyn PreferenceRepository>,
    sender: Arc<OutboundSender>,
}

impl NotificationFanout {
    pub fn new(preferences: Arc<dyn PreferenceRepository>, sender: Arc<OutboundSender>) -> Self {
        Self {
            preferences,
            sender,
        }
    }

    /// Deliver one notification; returns the records of the channels attempted
    pub async fn notify(&self, notification: &Notification) -> Vec<DeliveryRecord> {
        let preference = match self.preferences.find(notification.tenant_id).await {
            Ok(Some(preference)) => preference,
            Ok(None) => {
                tracing::warn!(
                    tenant_id = %notification.tenant_id,
                    category = %notification.category,
                    "No notification preferences set for tenant, nothing sent"
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(
                    tenant_id = %notification.tenant_id,
                    error = %e,
                    "Failed to load notification preferences"
                );
                return Vec::new();
            }
        };

        let channel = match channel_for_address(&notification.recipient) {
            Some(DeliveryChannel::Email) if preference.notify_by_email => DeliveryChannel::Email,
            Some(DeliveryChannel::Whatsapp) if preference.notify_by_whatsapp => {
                DeliveryChannel::Whatsapp
            }
            _ => {
                tracing::debug!(
                    tenant_id = %notification.tenant_id,
                    recipient = %notification.recipient,
                    "Recipient matches no enabled channel"
                );
                return Vec::new();
            }
        };

        let record = self
            .sender
            .deliver(Outbound {
                tenant_id: notification.tenant_id,
                channel,
                category: &notification.category,
                recipient: notification.recipient.trim(),
                body: &notification.content,
            })
            .await;

        vec![record]
    }

    /// Deliver the same content to several recipients, each independently
    pub async fn notify_all(
        &self,
        tenant_id: Uuid,
        category: &str,
        recipients: &[String],
        content: &str,
    ) -> Vec<DeliveryRecord> {
        let mut records = Vec::new();
        for recipient in recipients {
            let notification = Notification {
                tenant_id,
                category: category.to_string(),
                recipient: recipient.clone(),
                content: content.to_string(),
            };
            records.extend(self.notify(&notification).await);
        }
        records
    }

    /// Compose and deliver a low-stock alert
    pub async fn notify_low_stock(
        &self,
        tenant_id: Uuid,
        recipients: &[String],
        items: &[LowStockItem],
    ) -> Vec<DeliveryRecord> {
        match compose_low_stock_alert(items) {
            Some(content) => {
                self.notify_all(tenant_id, LOW_STOCK_ALERT, recipients, &content)
                    .await
            }
            None => Vec::new(),
        }
    }
}
