//! WhatsApp Cloud API (Graph API) client
//!
//! - `POST /{version}/{phone_number_id}/messages` for outbound text
//! - `GET /{version}/{media_id}` to resolve media, then an authenticated GET
//!   of the returned URL to download it

use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{ChannelError, MediaInfo, MediaService, MessagingService, SendReceipt, WhatsAppConfig};

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextPayload<'a>,
}

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaLookupResponse {
    url: String,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorResponse {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    code: Option<i64>,
}

/// Graph API client; one instance serves both messaging and media
pub struct GraphApiClient {
    client: Client,
    config: WhatsAppConfig,
}

impl GraphApiClient {
    pub fn new(config: WhatsAppConfig) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ChannelError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.graph_base_url.trim_end_matches('/'),
            self.config.api_version,
            path
        )
    }

    async fn error_from(response: reqwest::Response) -> ChannelError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());

        match serde_json::from_str::<GraphErrorResponse>(&body) {
            Ok(parsed) => ChannelError::Response(format!(
                "Graph API error ({}): {}",
                parsed.error.code.unwrap_or_default(),
                parsed.error.message
            )),
            Err(_) => ChannelError::Response(format!("Graph API returned {}: {}", status, body)),
        }
    }
}

/// Graph API expects the recipient without the leading `+`
fn normalize_recipient(to: &str) -> &str {
    to.trim().trim_start_matches('+')
}

#[async_trait::async_trait]
impl MessagingService for GraphApiClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<SendReceipt, ChannelError> {
        let recipient = normalize_recipient(to);
        if recipient.is_empty() {
            return Err(ChannelError::Request("Recipient is empty".to_string()));
        }

        let url = self.endpoint(&format!("{}/messages", self.config.phone_number_id));
        let request = SendTextRequest {
            messaging_product: "whatsapp",
            to: recipient,
            message_type: "text",
            text: TextPayload { body },
        };

        tracing::debug!(recipient = %recipient, "Sending WhatsApp text message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Response(format!("Failed to parse response: {}", e)))?;

        Ok(SendReceipt {
            message_id: parsed.messages.into_iter().next().map(|m| m.id),
        })
    }
}

#[async_trait::async_trait]
impl MediaService for GraphApiClient {
    async fn resolve_media(&self, media_id: &str) -> Result<MediaInfo, ChannelError> {
        let response = self
            .client
            .get(self.endpoint(media_id))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let lookup: MediaLookupResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Response(format!("Failed to parse media lookup: {}", e)))?;

        Ok(MediaInfo {
            url: lookup.url,
            mime_type: lookup.mime_type,
        })
    }

    async fn download(&self, url: &str) -> Result<Bytes, ChannelError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let bytes = response.bytes().await?;
        tracing::debug!(size_bytes = bytes.len(), "Downloaded WhatsApp media");
        Ok(bytes)
    }
}
