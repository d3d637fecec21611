//! Route definitions for Assistant domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{chatbot, webhook};
use super::middleware::{AssistantState, ChatbotState};

/// Provider-facing webhook: subscription handshake and deliveries
pub fn webhook_routes() -> Router<AssistantState> {
    Router::new().route(
        "/v1/whatsapp/webhook",
        get(webhook::verify_webhook).post(webhook::receive_webhook),
    )
}

/// Synchronous reply preview for internal callers; mount only where enabled
pub fn chatbot_test_routes() -> Router<ChatbotState> {
    Router::new().route("/v1/chatbot/test", post(chatbot::test_chatbot))
}
