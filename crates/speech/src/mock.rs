//! Mock Transcription Service
//!
//! Returns a programmable transcript and records each call, including whether
//! the audio file existed when it was handed over.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::{TranscriptionError, TranscriptionService};

/// What the mock should answer
#[derive(Debug, Clone, PartialEq)]
pub enum MockTranscription {
    Text(String),
    Fail,
}

impl Default for MockTranscription {
    fn default() -> Self {
        MockTranscription::Text("mock transcript".to_string())
    }
}

/// A recorded transcription call
#[derive(Debug, Clone)]
pub struct TranscriptionCall {
    pub audio_path: PathBuf,
    pub mime_type: String,
    pub audio_len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockTranscriptionService {
    outcome: Arc<RwLock<MockTranscription>>,
    calls: Arc<Mutex<Vec<TranscriptionCall>>>,
}

impl MockTranscriptionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(outcome: MockTranscription) -> Self {
        let service = Self::default();
        service.set_outcome(outcome);
        service
    }

    pub fn set_outcome(&self, outcome: MockTranscription) {
        *self.outcome.write().unwrap() = outcome;
    }

    pub fn calls(&self) -> Vec<TranscriptionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(
        &self,
        audio_path: &Path,
        mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        let audio = tokio::fs::read(audio_path).await?;

        self.calls.lock().unwrap().push(TranscriptionCall {
            audio_path: audio_path.to_path_buf(),
            mime_type: mime_type.to_string(),
            audio_len: audio.len(),
        });

        let outcome = self.outcome.read().unwrap().clone();
        match outcome {
            MockTranscription::Text(text) => Ok(text),
            MockTranscription::Fail => Err(TranscriptionError::Response(
                "mock transcription failure".to_string(),
            )),
        }
    }
}
