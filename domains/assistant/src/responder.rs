//! Generative Responder
//!
//! Single-turn completion with the assistant persona. Never fails: errors,
//! timeouts and empty completions all become the fixed "did not understand"
//! reply.

use std::sync::Arc;
use std::time::Duration;

use deji_llm::{CompletionRequest, LlmService};

use crate::domain::replies::{ASSISTANT_PERSONA, NOT_UNDERSTOOD};

const TEMPERATURE: f32 = 0.2;

#[derive(Clone)]
pub struct GenerativeResponder {
    llm: Arc<dyn LlmService>,
    timeout: Duration,
}

impl GenerativeResponder {
    pub fn new(llm: Arc<dyn LlmService>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn respond(&self, text: &str) -> String {
        let request =
            CompletionRequest::single_turn(ASSISTANT_PERSONA, text).with_temperature(TEMPERATURE);

        match tokio::time::timeout(self.timeout, self.llm.complete(request)).await {
            Ok(Ok(response)) => {
                let content = response.content.trim();
                if content.is_empty() {
                    tracing::warn!(model = %response.model, "Completion was empty");
                    NOT_UNDERSTOOD.to_string()
                } else {
                    content.to_string()
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Completion failed");
                NOT_UNDERSTOOD.to_string()
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Completion timed out");
                NOT_UNDERSTOOD.to_string()
            }
        }
    }
}
