//! Deji Speech Service
//!
//! Speech-to-text for inbound voice notes:
//! - OpenAI Whisper (`/v1/audio/transcriptions`)
//! - Programmable mock for tests and local development

pub mod mock;
pub mod whisper;

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MODEL: &str = "whisper-1";

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Transcription configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcription request error: {0}")]
    Request(String),

    #[error("Transcription response error: {0}")]
    Response(String),
}

/// Speech service configuration
#[derive(Clone)]
pub struct SpeechConfig {
    /// Provider (whisper, mock)
    pub provider: String,
    pub api_key: String,
    pub model: String,
    /// Override for the provider base URL (tests, proxies)
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SpeechConfig {
    /// Create speech config from environment variables
    pub fn from_env() -> Result<Self, TranscriptionError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("SPEECH_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();

        if provider == "whisper" && api_key.is_empty() {
            return Err(TranscriptionError::Configuration(
                "OPENAI_API_KEY is required for provider whisper".to_string(),
            ));
        }

        let timeout = std::env::var("SPEECH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            provider,
            api_key,
            model: std::env::var("SPEECH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("SPEECH_BASE_URL").ok(),
            timeout,
        })
    }
}

/// Speech-to-text capability
#[async_trait::async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe the audio file at `audio_path`
    async fn transcribe(&self, audio_path: &Path, mime_type: &str)
        -> Result<String, TranscriptionError>;
}

/// File extension matching an audio MIME type; parameters such as `codecs=` are ignored
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/aac" => "aac",
        "audio/amr" => "amr",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/webm" => "webm",
        _ => "ogg",
    }
}

/// Speech service factory
pub struct TranscriptionServiceFactory;

impl TranscriptionServiceFactory {
    pub fn create(config: SpeechConfig) -> Result<Box<dyn TranscriptionService>, TranscriptionError> {
        match config.provider.as_str() {
            "whisper" => {
                tracing::info!(model = %config.model, "Creating Whisper transcription service");
                Ok(Box::new(whisper::WhisperTranscriber::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock transcription service");
                Ok(Box::new(mock::MockTranscriptionService::new()))
            }
            provider => Err(TranscriptionError::Configuration(format!(
                "Unknown speech provider: {}. Supported providers: whisper, mock",
                provider
            ))),
        }
    }
}
