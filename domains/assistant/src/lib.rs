//! Assistant domain: inbound message pipeline, intent routing, admin commands

pub mod api;
pub mod audio;
pub mod commands;
pub mod domain;
pub mod pipeline;
pub mod repository;
pub mod responder;
pub mod retention;
pub mod tools;
pub mod worker;

// Re-export domain types at the crate root for convenience
pub use domain::command::{Command, UsageHelp};
pub use domain::entities::{Invoice, LedgerEntry, LedgerKind, Product};
pub use domain::envelope::{InboundEnvelope, MessageKind};
pub use domain::intent::{classify, Intent};
pub use domain::role::SenderRole;

// Re-export services
pub use audio::{AudioError, AudioProcessor};
pub use commands::CommandDispatcher;
pub use pipeline::{EnvelopeProcessor, MessagePipeline, PipelineOutcome};
pub use responder::GenerativeResponder;
pub use retention::{spawn_receipt_pruner, ReceiptPruner, PRUNE_INTERVAL};
pub use tools::{LastTokenExtractor, ProductNameExtractor, ToolHandlers};
pub use worker::{spawn_pipeline_worker, PipelineQueue, PipelineWorker};

// Re-export repository types
pub use repository::{AssistantRepositories, InMemoryAssistantStore};

// Re-export API types
pub use api::routes;
pub use api::{AssistantState, ChatbotState, WebhookSecrets};
