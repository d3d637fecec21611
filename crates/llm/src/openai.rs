//! OpenAI Chat Completions (`POST {base_url}/v1/chat/completions`)
//!
//! The persona travels as a leading `system` message.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    send_json, CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmService, TokenUsage,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub struct OpenAiService {
    client: Client,
    endpoint: String,
    config: LlmConfig,
}

impl OpenAiService {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Ok(Self {
            client: crate::http_client(config.timeout)?,
            endpoint: format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            config,
        })
    }
}

#[async_trait::async_trait]
impl LlmService for OpenAiService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = self.config.model_for(request.model);

        let system = request.system_prompt.map(|content| ChatMessage {
            role: "system",
            content,
        });
        let messages = system
            .into_iter()
            .chain(request.messages.into_iter().map(|m| ChatMessage {
                role: m.role.as_str(),
                content: m.content,
            }))
            .collect();

        let body = ChatRequest {
            model: &model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature,
            messages,
        };

        tracing::debug!(model = %model, "OpenAI completion request");

        let reply: ChatResponse = send_json(
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&body),
            "OpenAI",
        )
        .await?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: content.trim().to_string(),
            model: reply.model,
            usage: reply
                .usage
                .map(|u| TokenUsage {
                    input: u.prompt_tokens,
                    output: u.completion_tokens,
                })
                .unwrap_or_default(),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
