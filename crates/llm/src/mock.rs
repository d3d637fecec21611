//! Programmable completion backend for tests and `LLM_PROVIDER=mock`

use std::sync::{Arc, Mutex, RwLock};

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService, TokenUsage};

const MOCK_MODEL: &str = "mock-model";

/// What the mock should answer
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockLlmOutcome {
    /// Reply with "Mock response to: {last user message}"
    #[default]
    Echo,
    /// Reply with a fixed text
    Reply(String),
    /// Reply with an empty completion
    Empty,
    /// Fail with a request error
    Fail,
}

/// Answers per the configured outcome and records every request.
///
/// Clones share state, so a test can keep a handle to assert on.
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    outcome: Arc<RwLock<MockLlmOutcome>>,
    history: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(outcome: MockLlmOutcome) -> Self {
        let service = Self::default();
        service.set_outcome(outcome);
        service
    }

    pub fn set_outcome(&self, outcome: MockLlmOutcome) {
        *self.outcome.write().unwrap() = outcome;
    }

    /// Requests received so far
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.history.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.history.lock().unwrap().push(request.clone());
        let outcome = self.outcome.read().unwrap().clone();

        tracing::debug!(outcome = ?outcome, "Mock completion");

        let content = match outcome {
            MockLlmOutcome::Echo => {
                let last_message = request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                format!("Mock response to: {}", last_message)
            }
            MockLlmOutcome::Reply(text) => text,
            MockLlmOutcome::Empty => String::new(),
            MockLlmOutcome::Fail => {
                return Err(LlmError::Request("mock completion failure".to_string()))
            }
        };

        let input = request
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count() as u32)
            .sum();

        Ok(CompletionResponse {
            usage: TokenUsage {
                input,
                output: content.split_whitespace().count() as u32,
            },
            content,
            model: if request.model.is_empty() {
                MOCK_MODEL.to_string()
            } else {
                request.model
            },
        })
    }

    fn default_model(&self) -> &str {
        MOCK_MODEL
    }
}
