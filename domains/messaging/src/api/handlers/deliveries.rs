//! Delivery log handlers

use axum::{
    extract::{Query, State},
    Json,
};
use deji_common::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notifications::DeliveryResponse;
use crate::api::middleware::{InternalCaller, MessagingState};
use crate::domain::entities::{DeliveryChannel, DeliveryFilter, DeliveryStatus};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListDeliveriesQuery {
    pub tenant_id: Uuid,
    pub channel: Option<DeliveryChannel>,
    pub category: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub recipient: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct ListDeliveriesResponse {
    pub data: Vec<DeliveryResponse>,
    pub meta: PageMeta,
}

/// List a tenant's delivery records, newest first
pub async fn list_deliveries(
    _caller: InternalCaller,
    State(state): State<MessagingState>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Result<Json<ListDeliveriesResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let filter = DeliveryFilter {
        channel: query.channel,
        category: query.category,
        status: query.status,
        recipient: query.recipient,
    };

    let records = state
        .repos
        .deliveries
        .list_for_tenant(query.tenant_id, &filter, limit, offset)
        .await?;

    Ok(Json(ListDeliveriesResponse {
        data: records.into_iter().map(Into::into).collect(),
        meta: PageMeta { limit, offset },
    }))
}
