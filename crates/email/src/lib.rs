//! Email channel for Deji notifications
//!
//! `EmailService` is the seam the messaging domain sends through. Production
//! uses AWS SES (LocalStack when `AWS_ENDPOINT_URL` is set); tests and local
//! runs use the capturing mock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aws_ses;
pub mod content;
pub mod mock;

const DEFAULT_SEND_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FROM: &str = "notifications@deji.app";

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Email validation error: {0}")]
    Validation(String),

    #[error("AWS SES error: {0}")]
    AwsSes(String),

    #[error("Email send timed out after {0:?}")]
    Timeout(Duration),
}

/// One outgoing email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    /// Notification category (e.g. `LOW_STOCK_ALERT`), kept for tracing and tests
    pub category: Option<String>,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        body_text: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            subject: subject.into(),
            body_text: body_text.into(),
            body_html: None,
            category: None,
        }
    }

    pub fn with_html(mut self, body_html: impl Into<String>) -> Self {
        self.body_html = Some(body_html.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Provider acknowledgement of a sent email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
}

impl EmailReceipt {
    fn now(message_id: String) -> Self {
        Self {
            message_id,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// `ses` or `mock`
    pub provider: String,
    pub aws_region: Option<String>,
    /// LocalStack endpoint
    pub aws_endpoint_url: Option<String>,
    pub default_from: String,
    /// Display name for the From header
    pub from_name: String,
    /// When false every send is acknowledged without leaving the process
    pub enabled: bool,
    pub send_timeout: Duration,
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();

        let enabled = match std::env::var("EMAIL_ENABLED") {
            Ok(v) => v.parse().map_err(|_| {
                EmailError::Configuration(format!("EMAIL_ENABLED must be true or false, got {}", v))
            })?,
            Err(_) => true,
        };

        let send_timeout = std::env::var("EMAIL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS));

        Ok(Self {
            provider: std::env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "mock".to_string()),
            aws_region: std::env::var("AWS_REGION").ok(),
            aws_endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            default_from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string()),
            from_name: std::env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Deji".to_string()),
            enabled,
            send_timeout,
        })
    }
}

#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError>;

    /// Sender address used when the caller does not pick one
    fn default_from(&self) -> String;

    /// Send a system notification whose body is plain text.
    ///
    /// The HTML part is derived from the text, so both parts always agree.
    async fn send_notification(
        &self,
        recipient: &str,
        category: &str,
        body: &str,
    ) -> Result<EmailReceipt, EmailError> {
        let message = EmailMessage::new(
            recipient,
            self.default_from(),
            content::notification_subject(category),
            body,
        )
        .with_html(content::notification_html(body))
        .with_category(category);

        self.send_email(message).await
    }
}

pub struct EmailServiceFactory;

impl EmailServiceFactory {
    pub async fn create(config: EmailConfig) -> Result<Box<dyn EmailService>, EmailError> {
        if !config.enabled {
            tracing::info!("Email disabled; sends are acknowledged without delivery");
            return Ok(Box::new(mock::MockEmailService::new_disabled()));
        }

        match config.provider.as_str() {
            "ses" | "aws-ses" => {
                tracing::info!(region = ?config.aws_region, "Creating AWS SES email service");
                Ok(Box::new(aws_ses::SesEmailService::new(config).await?))
            }
            "mock" => {
                tracing::info!("Creating mock email service");
                Ok(Box::new(mock::MockEmailService::new()))
            }
            other => Err(EmailError::Configuration(format!(
                "Unknown email provider: {} (expected ses or mock)",
                other
            ))),
        }
    }
}
