//! AWS SES delivery
//!
//! LocalStack is used instead of real AWS when `aws_endpoint_url` is set.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_ses::config::SharedCredentialsProvider;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use aws_sdk_ses::Client as SesClient;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

const DEFAULT_REGION: &str = "us-east-1";

pub struct SesEmailService {
    client: SesClient,
    config: EmailConfig,
}

impl SesEmailService {
    pub async fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let sdk_config = load_sdk_config(&config).await;
        Ok(Self {
            client: SesClient::new(&sdk_config),
            config,
        })
    }

    /// `Deji <notifications@deji.app>` unless the address already carries a name
    fn from_header(&self, address: &str) -> String {
        if self.config.from_name.is_empty() || address.contains('<') {
            address.to_string()
        } else {
            format!("{} <{}>", self.config.from_name, address)
        }
    }
}

async fn load_sdk_config(config: &EmailConfig) -> SdkConfig {
    let region = Region::new(
        config
            .aws_region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
    );
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

    match &config.aws_endpoint_url {
        Some(endpoint_url) => {
            tracing::info!(endpoint_url = %endpoint_url, "SES pointed at a custom endpoint");
            // LocalStack accepts any static credentials
            let credentials = Credentials::new("test", "test", None, None, "deji-localstack");
            loader
                .endpoint_url(endpoint_url)
                .credentials_provider(SharedCredentialsProvider::new(credentials))
                .load()
                .await
        }
        None => loader.load().await,
    }
}

fn utf8(data: &str, part: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError::AwsSes(format!("invalid {}: {}", part, e)))
}

fn to_ses_message(message: &EmailMessage) -> Result<Message, EmailError> {
    let mut body = Body::builder().text(utf8(&message.body_text, "text body")?);
    if let Some(html) = &message.body_html {
        body = body.html(utf8(html, "html body")?);
    }

    Ok(Message::builder()
        .subject(utf8(&message.subject, "subject")?)
        .body(body.build())
        .build())
}

#[async_trait::async_trait]
impl EmailService for SesEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if !message.to.contains('@') || !message.from.contains('@') {
            return Err(EmailError::Validation(format!(
                "not an email address: {}",
                message.to
            )));
        }

        let request = self
            .client
            .send_email()
            .source(self.from_header(&message.from))
            .destination(Destination::builder().to_addresses(&message.to).build())
            .message(to_ses_message(&message)?);

        let output = tokio::time::timeout(self.config.send_timeout, request.send())
            .await
            .map_err(|_| EmailError::Timeout(self.config.send_timeout))?
            .map_err(|e| EmailError::AwsSes(e.to_string()))?;

        let message_id = output.message_id().to_string();
        tracing::info!(
            recipient = %message.to,
            category = ?message.category,
            message_id = %message_id,
            "Email sent via SES"
        );

        Ok(EmailReceipt::now(message_id))
    }

    fn default_from(&self) -> String {
        self.config.default_from.clone()
    }
}
