//! Chatbot test handler
//!
//! Runs classification and reply generation synchronously for a tenant.
//! Nothing is sent and no stored data changes; commands that would mutate
//! or send are answered with a notice.

use axum::{extract::State, Json};
use deji_common::{Result, ValidatedJson};
use deji_messaging::InternalCaller;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ChatbotState;
use crate::domain::role::SenderRole;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatbotTestRequest {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub from: String,
    #[validate(length(min = 1, max = 4096))]
    pub text: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatbotTestResponse {
    pub reply: String,
}

pub async fn test_chatbot(
    _caller: InternalCaller,
    State(state): State<ChatbotState>,
    ValidatedJson(req): ValidatedJson<ChatbotTestRequest>,
) -> Result<Json<ChatbotTestResponse>> {
    let role = if req.is_admin {
        SenderRole::AdminOrStaff
    } else {
        SenderRole::Customer
    };

    tracing::info!(
        tenant_id = %req.tenant_id,
        from = %req.from,
        privileged = role.is_privileged(),
        "Chatbot test message"
    );

    let reply = state
        .pipeline
        .preview_reply(req.tenant_id, role, req.text.trim())
        .await;

    Ok(Json(ChatbotTestResponse { reply }))
}
