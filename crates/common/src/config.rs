//! Configuration management following 12-factor app principles
//!
//! Process-level settings are loaded from environment variables. Provider
//! credentials live next to the client that uses them (`LlmConfig`,
//! `EmailConfig`, `WhatsAppConfig`, `SpeechConfig`).

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_QUEUE_CAPACITY: usize = 256;
const DEFAULT_WORKER_CONCURRENCY: usize = 8;
const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 20;
const DEFAULT_RECEIPT_RETENTION_HOURS: u64 = 7 * 24;

#[derive(Clone)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Token echoed back during webhook subscription verification
    pub whatsapp_verify_token: String,
    /// App secret used to check `X-Hub-Signature-256`; unchecked when absent
    pub whatsapp_app_secret: Option<String>,

    /// Shared secret for internal business-event routes; routes are not mounted when absent
    pub internal_api_token: Option<String>,
    /// Mounts the synchronous chatbot test route
    pub chatbot_test_enabled: bool,

    /// Inbound work queue sizing
    pub queue_capacity: usize,
    pub worker_concurrency: usize,

    /// Upper bound applied to every external call made by the pipeline
    pub external_timeout: Duration,

    /// How long inbound message ids are remembered for redelivery detection
    pub receipt_retention: Duration,

    /// Directory holding downloaded voice notes while they are transcribed
    pub media_tmp_dir: PathBuf,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("whatsapp_verify_token", &"[REDACTED]")
            .field(
                "whatsapp_app_secret",
                &self.whatsapp_app_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "internal_api_token",
                &self.internal_api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("chatbot_test_enabled", &self.chatbot_test_enabled)
            .field("queue_capacity", &self.queue_capacity)
            .field("worker_concurrency", &self.worker_concurrency)
            .field("external_timeout", &self.external_timeout)
            .field("receipt_retention", &self.receipt_retention)
            .field("media_tmp_dir", &self.media_tmp_dir)
            .field("rust_log", &self.rust_log)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            whatsapp_verify_token: env::var("WHATSAPP_VERIFY_TOKEN")
                .map_err(|_| anyhow::anyhow!("WHATSAPP_VERIFY_TOKEN is required"))?,
            whatsapp_app_secret: non_empty_var("WHATSAPP_APP_SECRET"),

            internal_api_token: non_empty_var("INTERNAL_API_TOKEN"),
            chatbot_test_enabled: env::var("CHATBOT_TEST_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),

            queue_capacity: parse_var("PIPELINE_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY).max(1),
            worker_concurrency: parse_var("PIPELINE_WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY)
                .max(1),

            external_timeout: Duration::from_secs(parse_var(
                "EXTERNAL_TIMEOUT_SECS",
                DEFAULT_EXTERNAL_TIMEOUT_SECS,
            )),

            receipt_retention: Duration::from_secs(
                parse_var("RECEIPT_RETENTION_HOURS", DEFAULT_RECEIPT_RETENTION_HOURS).max(1) * 3600,
            ),

            media_tmp_dir: env::var("MEDIA_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "deji=debug".to_string()),
            port: parse_var("PORT", DEFAULT_PORT),
        };

        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
