//! WhatsApp webhook handlers
//!
//! The receive handler only validates, applies delivery-status callbacks and
//! enqueues; pipeline work happens after the acknowledgement.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use deji_common::{Error, Result};
use deji_messaging::DeliveryStatus;
use deji_whatsapp::webhook::{verify_signature, WebhookPayload, SIGNATURE_HEADER};
use serde::Deserialize;

use crate::api::middleware::AssistantState;
use crate::domain::envelope::InboundEnvelope;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Subscription handshake: echo the challenge when the token matches
pub async fn verify_webhook(
    State(state): State<AssistantState>,
    Query(query): Query<VerifyQuery>,
) -> Result<String> {
    let subscribed = query.mode.as_deref() == Some("subscribe")
        && query
            .verify_token
            .as_deref()
            .is_some_and(|t| state.secrets.verify_token_matches(t));

    match (subscribed, query.challenge) {
        (true, Some(challenge)) => {
            tracing::info!("Webhook subscription verified");
            Ok(challenge)
        }
        _ => {
            tracing::warn!(mode = ?query.mode, "Webhook verification rejected");
            Err(Error::Authorization("Webhook verification failed".to_string()))
        }
    }
}

/// Inbound webhook delivery
pub async fn receive_webhook(
    State(state): State<AssistantState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    if let Some(secret) = state.secrets.app_secret() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Authentication("Missing webhook signature".to_string()))?;

        if !verify_signature(&body, signature, secret) {
            tracing::warn!("Rejected webhook with invalid signature");
            return Err(Error::Authentication("Invalid webhook signature".to_string()));
        }
    }

    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| Error::Validation("Webhook body is not valid JSON".to_string()))?;

    if value.get("entry").is_none() {
        return Err(Error::Validation("Webhook body has no entry".to_string()));
    }

    let payload: WebhookPayload = match serde_json::from_value(value) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Unrecognised webhook payload shape; acknowledging");
            return Ok(StatusCode::OK);
        }
    };

    apply_status_updates(&state, &payload).await;

    if let Some(envelope) = InboundEnvelope::first_in(&payload) {
        tracing::info!(
            channel_account_id = %envelope.channel_account_id,
            provider_message_id = ?envelope.provider_message_id,
            "Inbound message queued"
        );
        state.queue.enqueue(envelope);
    }

    Ok(StatusCode::OK)
}

async fn apply_status_updates(state: &AssistantState, payload: &WebhookPayload) {
    for update in payload.status_updates() {
        let Some(status) = DeliveryStatus::from_provider(&update.status) else {
            tracing::debug!(status = %update.status, "Ignoring unknown delivery status");
            continue;
        };

        let detail = update.error_detail();
        match state
            .deliveries
            .apply_status(&update.id, status, detail.as_deref())
            .await
        {
            Ok(changed) => tracing::debug!(
                provider_message_id = %update.id,
                status = %status,
                changed,
                "Delivery status applied"
            ),
            Err(e) => tracing::warn!(
                provider_message_id = %update.id,
                error = %e,
                "Failed to apply delivery status"
            ),
        }
    }
}
