//! Voice-note processing: media retrieval and speech transcription
//!
//! The downloaded audio lives in a scoped temporary file that is removed on
//! every exit path when it drops.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use deji_speech::{extension_for_mime, TranscriptionError, TranscriptionService};
use deji_whatsapp::{ChannelError, MediaService};

/// MIME type assumed when neither the webhook nor the media lookup gives one
const FALLBACK_AUDIO_MIME: &str = "audio/ogg";

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Voice note carried no media reference")]
    MissingMedia,

    #[error("Media retrieval failed: {0}")]
    Media(#[from] ChannelError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Temporary audio file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("Transcript was empty")]
    EmptyTranscript,
}

#[derive(Clone)]
pub struct AudioProcessor {
    media: Arc<dyn MediaService>,
    transcriber: Arc<dyn TranscriptionService>,
    tmp_dir: PathBuf,
    timeout: Duration,
}

impl AudioProcessor {
    pub fn new(
        media: Arc<dyn MediaService>,
        transcriber: Arc<dyn TranscriptionService>,
        tmp_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            media,
            transcriber,
            tmp_dir: tmp_dir.into(),
            timeout,
        }
    }

    /// Resolve, download and transcribe one voice note
    pub async fn transcribe(
        &self,
        media_id: &str,
        mime_hint: Option<&str>,
    ) -> Result<String, AudioError> {
        if media_id.trim().is_empty() {
            return Err(AudioError::MissingMedia);
        }

        let info = tokio::time::timeout(self.timeout, self.media.resolve_media(media_id))
            .await
            .map_err(|_| AudioError::Timeout("Media lookup", self.timeout))??;

        let mime_type = mime_hint
            .or(info.mime_type.as_deref())
            .unwrap_or(FALLBACK_AUDIO_MIME)
            .to_string();

        let bytes = tokio::time::timeout(self.timeout, self.media.download(&info.url))
            .await
            .map_err(|_| AudioError::Timeout("Media download", self.timeout))??;

        tokio::fs::create_dir_all(&self.tmp_dir).await?;
        let file = tempfile::Builder::new()
            .prefix("voice-")
            .suffix(&format!(".{}", extension_for_mime(&mime_type)))
            .tempfile_in(&self.tmp_dir)?;
        tokio::fs::write(file.path(), &bytes).await?;

        tracing::debug!(
            media_id = %media_id,
            mime_type = %mime_type,
            bytes = bytes.len(),
            path = %file.path().display(),
            "Voice note downloaded"
        );

        let transcript = tokio::time::timeout(
            self.timeout,
            self.transcriber.transcribe(file.path(), &mime_type),
        )
        .await
        .map_err(|_| AudioError::Timeout("Transcription", self.timeout))??;

        drop(file);

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(AudioError::EmptyTranscript);
        }

        Ok(transcript.to_string())
    }
}
