//! Notification API handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use deji_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::{InternalCaller, MessagingState};
use crate::domain::alerts::LowStockItem;
use crate::domain::entities::{DeliveryChannel, DeliveryRecord, DeliveryStatus};
use crate::fanout::Notification;

/// Request for sending a notification
#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    #[validate(length(min = 1, max = 320))]
    pub recipient: String,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

/// Request for a low-stock alert
#[derive(Debug, Deserialize, Validate)]
pub struct LowStockAlertRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1))]
    pub recipients: Vec<String>,
    pub products: Vec<LowStockProduct>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockProduct {
    pub name: String,
    pub stock: i32,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i32,
}

fn default_threshold() -> i32 {
    5
}

/// Delivery record DTO
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub channel: DeliveryChannel,
    pub category: String,
    pub recipient: String,
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<DeliveryRecord> for DeliveryResponse {
    fn from(r: DeliveryRecord) -> Self {
        Self {
            id: r.id,
            channel: r.channel,
            category: r.category,
            recipient: r.recipient,
            status: r.status,
            provider_message_id: r.provider_message_id,
            error_detail: r.error_detail,
            created_at: r.created_at,
            sent_at: r.sent_at,
        }
    }
}

/// Channels attempted for a notification
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub deliveries: Vec<DeliveryResponse>,
}

impl From<Vec<DeliveryRecord>> for NotificationResponse {
    fn from(records: Vec<DeliveryRecord>) -> Self {
        Self {
            deliveries: records.into_iter().map(Into::into).collect(),
        }
    }
}

/// Deliver a notification according to the tenant's preferences
pub async fn send_notification(
    _caller: InternalCaller,
    State(state): State<MessagingState>,
    ValidatedJson(req): ValidatedJson<SendNotificationRequest>,
) -> Result<Json<NotificationResponse>> {
    tracing::info!(
        tenant_id = %req.tenant_id,
        category = %req.category,
        "Internal notification requested"
    );

    let notification = Notification {
        tenant_id: req.tenant_id,
        category: req.category,
        recipient: req.recipient,
        content: req.content,
    };

    let records = state.fanout.notify(&notification).await;
    Ok(Json(records.into()))
}

/// Compose and deliver a low-stock alert
pub async fn send_low_stock_alert(
    _caller: InternalCaller,
    State(state): State<MessagingState>,
    ValidatedJson(req): ValidatedJson<LowStockAlertRequest>,
) -> Result<Json<NotificationResponse>> {
    let items: Vec<LowStockItem> = req
        .products
        .into_iter()
        .map(|p| LowStockItem {
            name: p.name,
            stock: p.stock,
            low_stock_threshold: p.low_stock_threshold,
        })
        .collect();

    tracing::info!(
        tenant_id = %req.tenant_id,
        products = items.len(),
        "Low-stock alert requested"
    );

    let records = state
        .fanout
        .notify_low_stock(req.tenant_id, &req.recipients, &items)
        .await;

    Ok(Json(records.into()))
}
