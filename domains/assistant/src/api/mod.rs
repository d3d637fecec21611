//! API layer for the Assistant domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::{AssistantState, ChatbotState, WebhookSecrets};
