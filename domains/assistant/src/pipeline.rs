//! Message Pipeline
//!
//! Drives one inbound envelope from tenant resolution to a delivered reply.
//! Steps run strictly in sequence; every downstream failure is absorbed here
//! and turned into a reply or a silent drop.

use std::sync::Arc;

use deji_messaging::{DeliveryRecord, OutboundSender, CHAT_REPLY};
use uuid::Uuid;

use crate::audio::AudioProcessor;
use crate::commands::CommandDispatcher;
use crate::domain::envelope::{InboundEnvelope, MessageKind};
use crate::domain::intent::{classify, is_command};
use crate::domain::replies;
use crate::domain::role::SenderRole;
use crate::repository::AssistantRepositories;
use crate::responder::GenerativeResponder;
use crate::tools::ToolHandlers;

/// How an envelope left the pipeline
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Tenant could not be resolved; nothing sent
    Dropped,
    /// Provider message id already processed; nothing sent
    Duplicate,
    /// A reply was attempted; the record carries the outcome
    Replied(DeliveryRecord),
}

/// Anything that consumes envelopes from the work queue
#[async_trait::async_trait]
pub trait EnvelopeProcessor: Send + Sync {
    async fn process(&self, envelope: InboundEnvelope) -> PipelineOutcome;
}

#[derive(Clone)]
pub struct MessagePipeline {
    repos: AssistantRepositories,
    tools: ToolHandlers,
    commands: CommandDispatcher,
    responder: GenerativeResponder,
    audio: AudioProcessor,
    sender: Arc<OutboundSender>,
}

impl MessagePipeline {
    pub fn new(
        repos: AssistantRepositories,
        sender: Arc<OutboundSender>,
        responder: GenerativeResponder,
        audio: AudioProcessor,
    ) -> Self {
        Self {
            tools: ToolHandlers::new(repos.clone()),
            commands: CommandDispatcher::new(repos.clone(), sender.clone()),
            repos,
            responder,
            audio,
            sender,
        }
    }

    /// Replace the tool handlers, e.g. to swap the product-name extractor
    pub fn with_tools(mut self, tools: ToolHandlers) -> Self {
        self.tools = tools;
        self
    }

    /// Reply text for normalized input: command, tool answer or generated text.
    ///
    /// The reply itself is not sent, but privileged commands run in full.
    pub async fn reply_to(&self, tenant_id: Uuid, role: SenderRole, text: &str) -> String {
        self.compose(tenant_id, role, text, false).await
    }

    /// Same as `reply_to` without side effects: commands that mutate or send
    /// are answered with a notice instead of running.
    pub async fn preview_reply(&self, tenant_id: Uuid, role: SenderRole, text: &str) -> String {
        self.compose(tenant_id, role, text, true).await
    }

    async fn compose(&self, tenant_id: Uuid, role: SenderRole, text: &str, preview: bool) -> String {
        let intent = classify(text);

        if is_command(text) {
            if role.is_privileged() {
                return if preview {
                    self.commands.preview(tenant_id, text).await
                } else {
                    self.commands.dispatch(tenant_id, text).await
                };
            }
            tracing::debug!(tenant_id = %tenant_id, "Command from unprivileged sender; generating reply");
            return self.responder.respond(text).await;
        }

        if let Some(answer) = self.tools.answer(intent, tenant_id, text).await {
            tracing::debug!(tenant_id = %tenant_id, intent = ?intent, "Answered by tool handler");
            return answer;
        }

        self.responder.respond(text).await
    }

    async fn resolve_tenant(&self, envelope: &InboundEnvelope) -> Option<Uuid> {
        match self
            .repos
            .identity
            .resolve_tenant(&envelope.channel_account_id)
            .await
        {
            Ok(Some(tenant_id)) => Some(tenant_id),
            Ok(None) => {
                tracing::info!(
                    channel_account_id = %envelope.channel_account_id,
                    "No tenant for channel account; dropping message"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    channel_account_id = %envelope.channel_account_id,
                    error = %e,
                    "Tenant lookup failed; dropping message"
                );
                None
            }
        }
    }

    /// False when the provider message id was already claimed
    async fn claim(&self, envelope: &InboundEnvelope) -> bool {
        let Some(message_id) = envelope.provider_message_id.as_deref() else {
            return true;
        };

        match self.repos.receipts.claim(message_id).await {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::warn!(
                    provider_message_id = %message_id,
                    error = %e,
                    "Receipt claim failed; processing anyway"
                );
                true
            }
        }
    }

    async fn sender_role(&self, tenant_id: Uuid, sender: &str) -> SenderRole {
        match self.repos.identity.sender_role(tenant_id, sender).await {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, error = %e, "Role lookup failed; treating sender as customer");
                SenderRole::Customer
            }
        }
    }

    async fn reply(&self, tenant_id: Uuid, to: &str, body: &str) -> PipelineOutcome {
        PipelineOutcome::Replied(self.sender.send_text(tenant_id, CHAT_REPLY, to, body).await)
    }
}

#[async_trait::async_trait]
impl EnvelopeProcessor for MessagePipeline {
    async fn process(&self, envelope: InboundEnvelope) -> PipelineOutcome {
        let Some(tenant_id) = self.resolve_tenant(&envelope).await else {
            return PipelineOutcome::Dropped;
        };

        if !self.claim(&envelope).await {
            tracing::info!(
                tenant_id = %tenant_id,
                provider_message_id = ?envelope.provider_message_id,
                "Duplicate delivery ignored"
            );
            return PipelineOutcome::Duplicate;
        }

        let role = self.sender_role(tenant_id, &envelope.sender).await;

        let text = match &envelope.kind {
            MessageKind::Text { body } => body.trim().to_string(),
            MessageKind::Audio {
                media_id,
                mime_type,
            } => match self.audio.transcribe(media_id, mime_type.as_deref()).await {
                Ok(transcript) => transcript,
                Err(e) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        media_id = %media_id,
                        error = %e,
                        "Voice note could not be processed"
                    );
                    return self
                        .reply(tenant_id, &envelope.sender, replies::TRANSCRIPTION_FAILED)
                        .await;
                }
            },
            MessageKind::Unsupported { type_tag } => {
                tracing::info!(tenant_id = %tenant_id, message_type = %type_tag, "Unsupported message type");
                return self
                    .reply(tenant_id, &envelope.sender, replies::UNSUPPORTED_MESSAGE)
                    .await;
            }
        };

        tracing::info!(
            tenant_id = %tenant_id,
            privileged = role.is_privileged(),
            "Processing inbound message"
        );

        let reply = self.reply_to(tenant_id, role, &text).await;
        self.reply(tenant_id, &envelope.sender, &reply).await
    }
}
