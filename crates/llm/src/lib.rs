//! Deji LLM Service
//!
//! Text-completion backends for the generative responder:
//! - OpenAI Chat Completions (production default)
//! - Anthropic Messages API
//! - Programmable mock for tests and local development

pub mod anthropic;
pub mod mock;
pub mod openai;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_TOKENS: u32 = 512;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

/// A completion request. An empty `model` selects the provider default.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Single-turn request: a persona and one user utterance
    pub fn single_turn(system_prompt: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            system_prompt: Some(system_prompt.into()),
            messages: vec![LlmMessage::user(user)],
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token counts reported by the provider; zero when it reports none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

/// Completion text, trimmed. Empty when the provider produced nothing.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// LLM service configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// `openai`, `anthropic` or `mock`
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    /// Override for the provider base URL (tests, proxies)
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmConfig {
    /// The request's model, or the configured default when it names none
    pub(crate) fn model_for(&self, requested: String) -> String {
        if requested.is_empty() {
            self.default_model.clone()
        } else {
            requested
        }
    }

    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let (key_var, default_model) = match provider.as_str() {
            "openai" => ("OPENAI_API_KEY", "gpt-4o-mini"),
            "anthropic" => ("ANTHROPIC_API_KEY", "claude-3-5-haiku-latest"),
            _ => ("LLM_API_KEY", "mock-model"),
        };

        let api_key = std::env::var(key_var).unwrap_or_default();
        if provider != "mock" && api_key.is_empty() {
            return Err(LlmError::Configuration(format!(
                "{} is required for provider {}",
                key_var, provider
            )));
        }

        let default_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model.to_string());

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            provider,
            api_key,
            default_model,
            max_tokens,
            base_url: std::env::var("LLM_BASE_URL").ok(),
            timeout,
        })
    }
}

/// Text-completion capability
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when the request leaves `model` empty
    fn default_model(&self) -> &str;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Error body shared by the OpenAI and Anthropic APIs
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Send a prepared request and decode a successful JSON body.
///
/// 429 maps to `RateLimit`; other failures carry the provider's own error
/// message when the body has one.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &'static str,
) -> Result<T, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::Request(format!("{} request failed: {}", provider, e)))?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimit);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ProviderErrorBody>(&body) {
            Ok(parsed) => format!(
                "{} ({})",
                parsed.error.message,
                parsed.error.kind.as_deref().unwrap_or("unknown")
            ),
            Err(_) => body,
        };
        return Err(LlmError::Response(format!(
            "{} returned {}: {}",
            provider, status, detail
        )));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Response(format!("{} response unreadable: {}", provider, e)))
}

pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!(model = %config.default_model, "Creating OpenAI LLM service");
                Ok(Box::new(openai::OpenAiService::new(config)?))
            }
            "anthropic" => {
                tracing::info!(model = %config.default_model, "Creating Anthropic LLM service");
                Ok(Box::new(anthropic::AnthropicService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            other => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {} (expected openai, anthropic or mock)",
                other
            ))),
        }
    }
}
