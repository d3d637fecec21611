//! Anthropic Messages API (`POST {base_url}/v1/messages`)

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    send_json, CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmService, TokenUsage,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Turn>,
}

#[derive(Serialize)]
struct Turn {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<Block>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// Only `text` blocks carry reply text; others are skipped.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicService {
    client: Client,
    endpoint: String,
    config: LlmConfig,
}

impl AnthropicService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Ok(Self {
            client: crate::http_client(config.timeout)?,
            endpoint: format!("{}/v1/messages", base.trim_end_matches('/')),
            config,
        })
    }
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = self.config.model_for(request.model);
        let body = MessagesRequest {
            model: &model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: request.system_prompt,
            temperature: request.temperature,
            messages: request
                .messages
                .into_iter()
                .map(|m| Turn {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
        };

        tracing::debug!(model = %model, "Anthropic completion request");

        let reply: MessagesResponse = send_json(
            self.client
                .post(&self.endpoint)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body),
            "Anthropic",
        )
        .await?;

        let content: String = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                Block::Text { text } => Some(text),
                Block::Other => None,
            })
            .collect();

        Ok(CompletionResponse {
            content: content.trim().to_string(),
            model: reply.model,
            usage: reply
                .usage
                .map(|u| TokenUsage {
                    input: u.input_tokens,
                    output: u.output_tokens,
                })
                .unwrap_or_default(),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
