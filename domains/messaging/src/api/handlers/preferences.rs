//! Notification preference handlers

use axum::{
    extract::{Path, State},
    Json,
};
use deji_common::{Error, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::{InternalCaller, MessagingState};
use crate::domain::entities::NotificationPreference;

#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub notify_by_email: bool,
    pub notify_by_whatsapp: bool,
}

pub async fn get_preferences(
    _caller: InternalCaller,
    State(state): State<MessagingState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<NotificationPreference>> {
    let preference = state
        .repos
        .preferences
        .find(tenant_id)
        .await?
        .ok_or_else(|| Error::NotFound("Notification preferences not found".to_string()))?;

    Ok(Json(preference))
}

pub async fn put_preferences(
    _caller: InternalCaller,
    State(state): State<MessagingState>,
    Path(tenant_id): Path<Uuid>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<NotificationPreference>> {
    let saved = state
        .repos
        .preferences
        .upsert(&NotificationPreference {
            tenant_id,
            notify_by_email: req.notify_by_email,
            notify_by_whatsapp: req.notify_by_whatsapp,
        })
        .await?;

    tracing::info!(
        tenant_id = %tenant_id,
        notify_by_email = saved.notify_by_email,
        notify_by_whatsapp = saved.notify_by_whatsapp,
        "Notification preferences updated"
    );

    Ok(Json(saved))
}
