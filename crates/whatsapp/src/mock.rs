//! Mock WhatsApp Service Implementation
//!
//! Records outbound messages and serves media from an in-memory table.
//! Sends and media lookups can be made to fail on demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::{ChannelError, MediaInfo, MediaService, MessagingService, SendReceipt};

/// Message recorded by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
    pub message_id: String,
}

#[derive(Debug, Clone)]
struct StoredMedia {
    mime_type: Option<String>,
    bytes: Bytes,
}

/// Mock messaging channel for testing
#[derive(Debug, Clone, Default)]
pub struct MockWhatsAppService {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    media: Arc<Mutex<HashMap<String, StoredMedia>>>,
    fail_sends: Arc<AtomicBool>,
    fail_media: Arc<AtomicBool>,
    counter: Arc<AtomicU64>,
}

impl MockWhatsAppService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent media lookups and downloads fail
    pub fn set_fail_media(&self, fail: bool) {
        self.fail_media.store(fail, Ordering::SeqCst);
    }

    /// Register a media object served by `resolve_media` / `download`
    pub fn add_media(&self, media_id: &str, mime_type: Option<&str>, bytes: impl Into<Bytes>) {
        self.media.lock().unwrap().insert(
            media_id.to_string(),
            StoredMedia {
                mime_type: mime_type.map(str::to_string),
                bytes: bytes.into(),
            },
        );
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages_to(&self, to: &str) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == to)
            .cloned()
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

fn mock_media_url(media_id: &str) -> String {
    format!("mock://media/{}", media_id)
}

#[async_trait::async_trait]
impl MessagingService for MockWhatsAppService {
    async fn send_text(&self, to: &str, body: &str) -> Result<SendReceipt, ChannelError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::Response("mock send failure".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let message_id = format!("wamid.mock-{}", n);

        tracing::info!(recipient = %to, message_id = %message_id, "Mock WhatsApp capturing message");

        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            message_id: message_id.clone(),
        });

        Ok(SendReceipt {
            message_id: Some(message_id),
        })
    }
}

#[async_trait::async_trait]
impl MediaService for MockWhatsAppService {
    async fn resolve_media(&self, media_id: &str) -> Result<MediaInfo, ChannelError> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(ChannelError::Response("mock media failure".to_string()));
        }

        let media = self.media.lock().unwrap();
        let stored = media
            .get(media_id)
            .ok_or_else(|| ChannelError::Response(format!("Unknown media id: {}", media_id)))?;

        Ok(MediaInfo {
            url: mock_media_url(media_id),
            mime_type: stored.mime_type.clone(),
        })
    }

    async fn download(&self, url: &str) -> Result<Bytes, ChannelError> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(ChannelError::Response("mock media failure".to_string()));
        }

        let media_id = url
            .strip_prefix("mock://media/")
            .ok_or_else(|| ChannelError::Request(format!("Not a mock media URL: {}", url)))?;

        self.media
            .lock()
            .unwrap()
            .get(media_id)
            .map(|m| m.bytes.clone())
            .ok_or_else(|| ChannelError::Response(format!("Unknown media id: {}", media_id)))
    }
}
