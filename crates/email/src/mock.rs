//! Capturing email service for tests and local development

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::{EmailError, EmailMessage, EmailReceipt, EmailService, DEFAULT_FROM};

#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub message_id: String,
}

impl CapturedEmail {
    pub fn category(&self) -> Option<&str> {
        self.message.category.as_deref()
    }
}

/// Records every email in send order; can be switched to failing or disabled.
///
/// Clones share the same capture buffer, so a test keeps one handle and gives
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockEmailService {
    captured: Arc<Mutex<Vec<CapturedEmail>>>,
    failing: Arc<AtomicBool>,
    disabled: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledges sends without capturing them (`EMAIL_ENABLED=false`)
    pub fn new_disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_emails_for_recipient(&self, recipient: &str) -> Vec<CapturedEmail> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.message.to == recipient)
            .cloned()
            .collect()
    }

    pub fn email_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if self.disabled {
            tracing::debug!(recipient = %message.to, "Email disabled, skipping send");
            return Ok(EmailReceipt::now(format!("disabled-{}", Uuid::new_v4())));
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::AwsSes("mock send failure".to_string()));
        }

        let message_id = format!("mock-{}", Uuid::new_v4());
        tracing::info!(
            recipient = %message.to,
            category = ?message.category,
            message_id = %message_id,
            "Mock email captured"
        );

        self.captured.lock().unwrap().push(CapturedEmail {
            message,
            message_id: message_id.clone(),
        });

        Ok(EmailReceipt::now(message_id))
    }

    fn default_from(&self) -> String {
        DEFAULT_FROM.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notification_is_captured_with_category() {
        let service = MockEmailService::new();

        let receipt = service
            .send_notification("owner@example.com", "LOW_STOCK_ALERT", "Rice is low")
            .await
            .unwrap();

        assert!(receipt.message_id.starts_with("mock-"));
        let captured = &service.get_emails_for_recipient("owner@example.com")[0];
        assert_eq!(captured.message_id, receipt.message_id);
        assert_eq!(captured.message.subject, "[LOW_STOCK_ALERT] Notification");
        assert_eq!(captured.message.body_text, "Rice is low");
        assert_eq!(captured.category(), Some("LOW_STOCK_ALERT"));
        assert!(captured
            .message
            .body_html
            .as_deref()
            .unwrap()
            .contains("Rice is low"));
    }

    #[tokio::test]
    async fn test_recipients_are_kept_apart() {
        let service = MockEmailService::new();
        for to in ["a@example.com", "b@example.com", "a@example.com"] {
            service.send_notification(to, "PAYMENT_RECEIVED", "paid").await.unwrap();
        }

        assert_eq!(service.email_count(), 3);
        assert_eq!(service.get_emails_for_recipient("a@example.com").len(), 2);
        assert!(service.get_emails_for_recipient("c@example.com").is_empty());
    }

    #[tokio::test]
    async fn test_failing_mock_captures_nothing() {
        let service = MockEmailService::new();
        service.set_failing(true);

        let result = service
            .send_notification("owner@example.com", "LOW_STOCK_ALERT", "Rice is low")
            .await;
        assert!(result.is_err());
        assert_eq!(service.email_count(), 0);

        service.set_failing(false);
        assert!(service
            .send_notification("owner@example.com", "LOW_STOCK_ALERT", "Rice is low")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_captures() {
        let service = MockEmailService::new();
        let handle = service.clone();

        service.send_notification("owner@example.com", "ORDER", "body").await.unwrap();

        assert_eq!(handle.email_count(), 1);
    }
}
