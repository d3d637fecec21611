//! Deji application composition root
//!
//! Builds every external client once, wires the domains together, starts the
//! pipeline worker and receipt pruner, and composes the domain routers into one application.

use std::sync::Arc;

use axum::Router;
use deji_assistant::{
    routes as assistant_routes, spawn_pipeline_worker, spawn_receipt_pruner, AssistantRepositories,
    AssistantState, AudioProcessor, ChatbotState, GenerativeResponder, MessagePipeline,
    PipelineWorker, ReceiptPruner, WebhookSecrets, PRUNE_INTERVAL,
};
use deji_common::Config;
use deji_email::{EmailConfig, EmailService, EmailServiceFactory};
use deji_llm::{LlmConfig, LlmService, LlmServiceFactory};
use deji_messaging::{
    routes as messaging_routes, InternalToken, MessagingRepositories, MessagingState,
    NotificationFanout, OutboundSender,
};
use deji_speech::{SpeechConfig, TranscriptionService, TranscriptionServiceFactory};
use deji_whatsapp::{WhatsAppConfig, WhatsAppServiceFactory, WhatsAppServices};
use sqlx::PgPool;

/// External clients shared by the domains
#[derive(Clone)]
pub struct AppServices {
    pub llm: Arc<dyn LlmService>,
    pub email: Arc<dyn EmailService>,
    pub whatsapp: WhatsAppServices,
    pub transcriber: Arc<dyn TranscriptionService>,
}

impl AppServices {
    /// Build every client from its own environment configuration
    pub async fn from_env() -> anyhow::Result<Self> {
        let llm = LlmServiceFactory::create(LlmConfig::from_env()?)?;
        let email = EmailServiceFactory::create(EmailConfig::from_env()?).await?;
        let whatsapp = WhatsAppServiceFactory::create(WhatsAppConfig::from_env()?)?;
        let transcriber = TranscriptionServiceFactory::create(SpeechConfig::from_env()?)?;

        tracing::info!(model = %llm.default_model(), "External clients created");

        Ok(Self {
            llm: Arc::from(llm),
            email: Arc::from(email),
            whatsapp,
            transcriber: Arc::from(transcriber),
        })
    }
}

/// Repositories for both domains
#[derive(Clone)]
pub struct AppRepositories {
    pub assistant: AssistantRepositories,
    pub messaging: MessagingRepositories,
}

impl AppRepositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            assistant: AssistantRepositories::postgres(pool.clone()),
            messaging: MessagingRepositories::postgres(pool),
        }
    }
}

/// The composed application and its background tasks
pub struct App {
    pub router: Router,
    pub worker: PipelineWorker,
    pub pruner: ReceiptPruner,
}

/// Create the application against PostgreSQL with clients from the environment
pub async fn create_app(config: &Config, pool: PgPool) -> anyhow::Result<App> {
    let services = AppServices::from_env().await?;
    Ok(build_app(config, services, AppRepositories::postgres(pool)))
}

/// Wire services and repositories into routers and start the background tasks.
///
/// Must be called inside a Tokio runtime.
pub fn build_app(config: &Config, services: AppServices, repos: AppRepositories) -> App {
    let timeout = config.external_timeout;

    let sender = Arc::new(OutboundSender::new(
        services.whatsapp.messaging.clone(),
        services.email.clone(),
        repos.messaging.deliveries.clone(),
        timeout,
    ));

    let pipeline = Arc::new(MessagePipeline::new(
        repos.assistant.clone(),
        sender.clone(),
        GenerativeResponder::new(services.llm.clone(), timeout),
        AudioProcessor::new(
            services.whatsapp.media.clone(),
            services.transcriber.clone(),
            config.media_tmp_dir.clone(),
            timeout,
        ),
    ));

    let (queue, worker) = spawn_pipeline_worker(
        pipeline.clone(),
        config.queue_capacity,
        config.worker_concurrency,
    );

    let pruner = spawn_receipt_pruner(
        repos.assistant.receipts.clone(),
        config.receipt_retention,
        PRUNE_INTERVAL,
    );

    let assistant_state = AssistantState {
        secrets: WebhookSecrets::new(
            config.whatsapp_verify_token.clone(),
            config.whatsapp_app_secret.clone(),
        ),
        queue,
        deliveries: repos.messaging.deliveries.clone(),
    };

    let mut app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Deji API v0.0.1-SNAPSHOT" }),
        )
        .merge(assistant_routes::webhook_routes().with_state(assistant_state.clone()));

    match (&config.internal_api_token, config.chatbot_test_enabled) {
        (Some(token), true) => {
            tracing::info!("Chatbot test route enabled");
            let chatbot_state = ChatbotState {
                pipeline,
                internal_token: InternalToken::new(token.clone()),
            };
            app = app.merge(assistant_routes::chatbot_test_routes().with_state(chatbot_state));
        }
        (None, true) => {
            tracing::warn!("CHATBOT_TEST_ENABLED requires INTERNAL_API_TOKEN; chatbot test route disabled")
        }
        (_, false) => {}
    }

    match &config.internal_api_token {
        Some(token) => {
            let messaging_state = MessagingState {
                fanout: Arc::new(NotificationFanout::new(
                    repos.messaging.preferences.clone(),
                    sender,
                )),
                repos: repos.messaging,
                internal_token: InternalToken::new(token.clone()),
            };
            app = app.merge(messaging_routes::routes().with_state(messaging_state));
        }
        None => tracing::warn!("INTERNAL_API_TOKEN not set; internal notification routes disabled"),
    }

    App {
        router: app,
        worker,
        pruner,
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
