//! OpenAI Whisper transcription client.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::{extension_for_mime, SpeechConfig, TranscriptionError, TranscriptionService};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: String,
}

/// OpenAI Whisper transcriber
pub struct WhisperTranscriber {
    client: Client,
    config: SpeechConfig,
    base_url: String,
}

impl WhisperTranscriber {
    pub fn new(config: SpeechConfig) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                TranscriptionError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            config,
            base_url,
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionService for WhisperTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        let audio = tokio::fs::read(audio_path).await?;
        let file_name = format!("voice-note.{}", extension_for_mime(mime_type));
        let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();

        let file_part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(essence)
            .map_err(|e| TranscriptionError::Request(format!("Invalid MIME type: {}", e)))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "json");

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );

        tracing::debug!(model = %self.config.model, mime_type = %essence, "Sending Whisper transcription request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Request(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Response(format!(
                "Whisper returned {}: {}",
                status, body
            )));
        }

        let parsed: WhisperResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Response(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.text.trim().to_string())
    }
}
