//! Deji WhatsApp Channel
//!
//! Messaging-channel integration for the WhatsApp Business Cloud API:
//! - Text message sending (`MessagingService`)
//! - Media lookup and download for voice notes (`MediaService`)
//! - Webhook payload types and `X-Hub-Signature-256` verification
//! - Programmable mock for tests and local development

pub mod graph;
pub mod mock;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v20.0";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel configuration error: {0}")]
    Configuration(String),

    #[error("Channel request error: {0}")]
    Request(String),

    #[error("Channel response error: {0}")]
    Response(String),

    #[error("Channel request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChannelError::Timeout
        } else {
            ChannelError::Request(e.to_string())
        }
    }
}

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Provider message id (`wamid...`), when the provider returned one
    pub message_id: Option<String>,
}

/// Short-lived download location of a media object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub url: String,
    pub mime_type: Option<String>,
}

/// WhatsApp channel configuration
#[derive(Clone)]
pub struct WhatsAppConfig {
    /// Provider (graph, mock)
    pub provider: String,
    pub access_token: String,
    /// Business phone-number id that outbound messages are sent from
    pub phone_number_id: String,
    pub api_version: String,
    pub graph_base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("provider", &self.provider)
            .field("access_token", &"[REDACTED]")
            .field("phone_number_id", &self.phone_number_id)
            .field("api_version", &self.api_version)
            .field("graph_base_url", &self.graph_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WhatsAppConfig {
    /// Create WhatsApp config from environment variables
    pub fn from_env() -> Result<Self, ChannelError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("WHATSAPP_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let access_token = std::env::var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default();
        let phone_number_id = std::env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default();

        if provider == "graph" && (access_token.is_empty() || phone_number_id.is_empty()) {
            return Err(ChannelError::Configuration(
                "WHATSAPP_ACCESS_TOKEN and WHATSAPP_PHONE_NUMBER_ID are required for provider graph"
                    .to_string(),
            ));
        }

        let timeout = std::env::var("WHATSAPP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            provider,
            access_token,
            phone_number_id,
            api_version: std::env::var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            graph_base_url: std::env::var("WHATSAPP_GRAPH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string()),
            timeout,
        })
    }
}

/// Outbound text delivery over the messaging channel
#[async_trait::async_trait]
pub trait MessagingService: Send + Sync {
    /// Send a plain-text message to a channel address (E.164, `+` optional)
    async fn send_text(&self, to: &str, body: &str) -> Result<SendReceipt, ChannelError>;
}

/// Retrieval of inbound media objects
#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    /// Resolve an opaque media reference to a download URL
    async fn resolve_media(&self, media_id: &str) -> Result<MediaInfo, ChannelError>;

    /// Fetch the bytes behind a resolved media URL
    async fn download(&self, url: &str) -> Result<Bytes, ChannelError>;
}

/// Messaging and media capabilities built from one configuration
#[derive(Clone)]
pub struct WhatsAppServices {
    pub messaging: Arc<dyn MessagingService>,
    pub media: Arc<dyn MediaService>,
}

/// Factory for WhatsApp channel implementations
pub struct WhatsAppServiceFactory;

impl WhatsAppServiceFactory {
    pub fn create(config: WhatsAppConfig) -> Result<WhatsAppServices, ChannelError> {
        match config.provider.as_str() {
            "graph" => {
                tracing::info!(
                    api_version = %config.api_version,
                    "Creating WhatsApp Graph API client"
                );
                let client = Arc::new(graph::GraphApiClient::new(config)?);
                Ok(WhatsAppServices {
                    messaging: client.clone(),
                    media: client,
                })
            }
            "mock" => {
                tracing::info!("Creating mock WhatsApp service");
                let mock = Arc::new(mock::MockWhatsAppService::new());
                Ok(WhatsAppServices {
                    messaging: mock.clone(),
                    media: mock,
                })
            }
            provider => Err(ChannelError::Configuration(format!(
                "Unknown WhatsApp provider: {}. Supported providers: graph, mock",
                provider
            ))),
        }
    }
}
