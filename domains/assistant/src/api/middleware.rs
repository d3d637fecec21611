//! Assistant domain state

use std::sync::Arc;

use axum::extract::FromRef;
use deji_messaging::{DeliveryLog, InternalToken};

use crate::pipeline::MessagePipeline;
use crate::worker::PipelineQueue;

/// Secrets shared with the messaging provider
#[derive(Clone)]
pub struct WebhookSecrets {
    verify_token: Arc<str>,
    app_secret: Option<Arc<str>>,
}

impl WebhookSecrets {
    pub fn new(verify_token: impl Into<String>, app_secret: Option<String>) -> Self {
        Self {
            verify_token: Arc::from(verify_token.into()),
            app_secret: app_secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }

    pub fn verify_token_matches(&self, presented: &str) -> bool {
        let expected = self.verify_token.as_bytes();
        let presented = presented.as_bytes();
        !expected.is_empty()
            && expected.len() == presented.len()
            && expected
                .iter()
                .zip(presented)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    /// Secret for `X-Hub-Signature-256` verification, when configured
    pub fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref()
    }
}

impl std::fmt::Debug for WebhookSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSecrets")
            .field("verify_token", &"[REDACTED]")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Application state for the Assistant domain
#[derive(Clone)]
pub struct AssistantState {
    pub secrets: WebhookSecrets,
    pub queue: PipelineQueue,
    pub deliveries: Arc<dyn DeliveryLog>,
}

/// State for the reply preview route; callers present the internal token
#[derive(Clone)]
pub struct ChatbotState {
    pub pipeline: Arc<MessagePipeline>,
    pub internal_token: InternalToken,
}

impl FromRef<ChatbotState> for InternalToken {
    fn from_ref(state: &ChatbotState) -> Self {
        state.internal_token.clone()
    }
}
