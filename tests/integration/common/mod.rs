//! Common test utilities and fixtures for integration tests
//!
//! Builds the full application router over in-memory repositories and mock
//! clients, so no database or network is needed:
//! - one seeded tenant reachable through `CHANNEL_ACCOUNT`, with an admin user
//! - request builders for JSON, webhook and internal calls
//! - `settle` to drain the pipeline worker before asserting on sends

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use deji_app::{build_app, App, AppRepositories, AppServices};
use deji_assistant::{
    AssistantRepositories, InMemoryAssistantStore, PipelineWorker, ReceiptPruner,
};
use deji_common::Config;
use deji_email::mock::MockEmailService;
use deji_llm::mock::MockLlmService;
use deji_messaging::{InMemoryMessagingStore, MessagingRepositories};
use deji_speech::mock::MockTranscriptionService;
use deji_whatsapp::mock::MockWhatsAppService;
use deji_whatsapp::WhatsAppServices;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

pub const CHANNEL_ACCOUNT: &str = "1098765";
pub const ADMIN_PHONE: &str = "2348000000001";
pub const CUSTOMER_PHONE: &str = "2348000000009";
pub const VERIFY_TOKEN: &str = "verify-me";
pub const INTERNAL_TOKEN: &str = "internal-test-token";

/// Process configuration for tests; tweak fields before building
pub fn test_config(media_tmp_dir: PathBuf) -> Config {
    Config {
        database_url: "postgresql://unused".to_string(),
        whatsapp_verify_token: VERIFY_TOKEN.to_string(),
        whatsapp_app_secret: None,
        internal_api_token: Some(INTERNAL_TOKEN.to_string()),
        chatbot_test_enabled: true,
        queue_capacity: 64,
        worker_concurrency: 4,
        external_timeout: Duration::from_secs(5),
        receipt_retention: Duration::from_secs(24 * 3600),
        media_tmp_dir,
        rust_log: "deji=debug".to_string(),
        port: 0,
    }
}

/// Full application over in-memory stores and mock clients
pub struct TestApp {
    pub router: Router,
    worker: Option<PipelineWorker>,
    _pruner: ReceiptPruner,
    pub store: InMemoryAssistantStore,
    pub messaging: InMemoryMessagingStore,
    pub whatsapp: MockWhatsAppService,
    pub email: MockEmailService,
    pub llm: MockLlmService,
    pub speech: MockTranscriptionService,
    pub tenant_id: Uuid,
    _media_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let mut config = test_config(media_dir.path().to_path_buf());
        adjust(&mut config);

        let store = InMemoryAssistantStore::new();
        let tenant_id = store.add_tenant(CHANNEL_ACCOUNT);
        store.add_user(tenant_id, &format!("+{}", ADMIN_PHONE), "admin");

        let messaging = InMemoryMessagingStore::new();
        let whatsapp = MockWhatsAppService::new();
        let email = MockEmailService::new();
        let llm = MockLlmService::new();
        let speech = MockTranscriptionService::new();

        let services = AppServices {
            llm: Arc::new(llm.clone()),
            email: Arc::new(email.clone()),
            whatsapp: WhatsAppServices {
                messaging: Arc::new(whatsapp.clone()),
                media: Arc::new(whatsapp.clone()),
            },
            transcriber: Arc::new(speech.clone()),
        };
        let repos = AppRepositories {
            assistant: AssistantRepositories::in_memory(store.clone()),
            messaging: MessagingRepositories::in_memory(messaging.clone()),
        };

        let App {
            router,
            worker,
            pruner,
        } = build_app(&config, services, repos);

        Self {
            router,
            worker: Some(worker),
            _pruner: pruner,
            store,
            messaging,
            whatsapp,
            email,
            llm,
            speech,
            tenant_id,
            _media_dir: media_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Wait until every queued message has been processed.
    ///
    /// Stops the worker; later webhook calls are acknowledged but not processed.
    pub async fn settle(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown().await;
        }
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Internal route request carrying `x-internal-token`
pub fn internal_request(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-internal-token", token);

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn webhook_request(body: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/whatsapp/webhook")
        .header("content-type", "application/json");

    if let Some(signature) = signature {
        builder = builder.header("x-hub-signature-256", signature);
    }

    builder.body(Body::from(body)).unwrap()
}

/// `sha256=<hex>` signature as sent by the provider
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Webhook payload carrying one message addressed to `CHANNEL_ACCOUNT`
pub fn message_payload(message: Value) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550001111",
                        "phone_number_id": CHANNEL_ACCOUNT
                    },
                    "messages": [message]
                }
            }]
        }]
    })
}

pub fn text_message(from: &str, id: &str, body: &str) -> Value {
    message_payload(json!({
        "from": from,
        "id": id,
        "timestamp": "1760000000",
        "type": "text",
        "text": {"body": body}
    }))
}

pub fn status_payload(provider_message_id: &str, status: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "metadata": {"phone_number_id": CHANNEL_ACCOUNT},
                    "statuses": [{
                        "id": provider_message_id,
                        "status": status,
                        "recipient_id": CUSTOMER_PHONE,
                        "timestamp": "1760000100"
                    }]
                }
            }]
        }]
    })
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
