//! Chatbot test route

use axum::http::StatusCode;
use deji_assistant::{Invoice, LedgerKind};
use deji_llm::mock::MockLlmOutcome;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::common::{
    body_json, internal_request, json_request, TestApp, CUSTOMER_PHONE, INTERNAL_TOKEN,
};

const ROUTE: &str = "/v1/chatbot/test";

async fn preview(app: &TestApp, body: Value) -> Value {
    let response = app
        .send(internal_request("POST", ROUTE, INTERNAL_TOKEN, Some(&body)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_route_absent_when_disabled() {
    let app = TestApp::with_config(|c| c.chatbot_test_enabled = false);

    let body = json!({"tenant_id": app.tenant_id, "from": CUSTOMER_PHONE, "text": "hi"});
    let response = app
        .send(internal_request("POST", ROUTE, INTERNAL_TOKEN, Some(&body)))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_route_absent_without_internal_token() {
    let app = TestApp::with_config(|c| c.internal_api_token = None);

    let response = app
        .send(json_request(
            "POST",
            ROUTE,
            &json!({"tenant_id": app.tenant_id, "from": CUSTOMER_PHONE, "text": "hi"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_or_wrong_token_is_unauthorized() {
    let app = TestApp::new();
    let body = json!({
        "tenant_id": app.tenant_id,
        "from": CUSTOMER_PHONE,
        "text": "#ledger balance",
        "is_admin": true
    });

    let missing = app.send(json_request("POST", ROUTE, &body)).await;
    let wrong = app
        .send(internal_request("POST", ROUTE, "not-the-token", Some(&body)))
        .await;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.llm.call_count(), 0);
}

#[tokio::test]
async fn test_tool_answer_without_sending() {
    let app = TestApp::new();
    app.store
        .add_product(app.tenant_id, "Widget", Decimal::new(1500, 0), 3);

    let reply = preview(
        &app,
        json!({
            "tenant_id": app.tenant_id,
            "from": CUSTOMER_PHONE,
            "text": "is widget in stock? widget"
        }),
    )
    .await;

    assert_eq!(reply["reply"], "Widget is in stock (3 left)");
    assert_eq!(app.whatsapp.sent_count(), 0);
    assert!(app.messaging.records().is_empty());
}

#[tokio::test]
async fn test_admin_flag_enables_commands() {
    let app = TestApp::new();
    app.store
        .add_ledger_entry(app.tenant_id, LedgerKind::Credit, Decimal::new(500, 0));
    app.store
        .add_ledger_entry(app.tenant_id, LedgerKind::Debit, Decimal::new(120, 0));

    let admin = preview(
        &app,
        json!({
            "tenant_id": app.tenant_id,
            "from": CUSTOMER_PHONE,
            "text": "#ledger balance",
            "is_admin": true
        }),
    )
    .await;
    assert_eq!(admin["reply"], "📊 Ledger balance: 380");

    app.llm
        .set_outcome(MockLlmOutcome::Reply("I can only help with orders.".to_string()));
    let customer = preview(
        &app,
        json!({
            "tenant_id": app.tenant_id,
            "from": CUSTOMER_PHONE,
            "text": "#ledger balance"
        }),
    )
    .await;
    assert_eq!(customer["reply"], "I can only help with orders.");
    assert_eq!(app.llm.call_count(), 1);
}

#[tokio::test]
async fn test_mutating_commands_are_not_run() {
    let app = TestApp::new();
    app.store.add_invoice(Invoice {
        id: 1,
        tenant_id: app.tenant_id,
        number: Some("INV-0001".to_string()),
        customer_name: Some("Ada".to_string()),
        status: "PENDING".to_string(),
        total: Decimal::new(4500, 0),
    });

    for text in ["#invoice 1 send +2349999999999", "#deliver all", "#deliver 1"] {
        let reply = preview(
            &app,
            json!({
                "tenant_id": app.tenant_id,
                "from": CUSTOMER_PHONE,
                "text": text,
                "is_admin": true
            }),
        )
        .await;
        assert!(
            reply["reply"]
                .as_str()
                .unwrap()
                .starts_with("🧪 Preview only"),
            "{}",
            text
        );
    }

    assert_eq!(app.whatsapp.sent_count(), 0);
    assert_eq!(app.email.email_count(), 0);
    assert!(app.messaging.records().is_empty());
    assert_eq!(
        app.store.invoice(app.tenant_id, 1).unwrap().status,
        "PENDING"
    );
}

#[tokio::test]
async fn test_empty_text_is_rejected() {
    let app = TestApp::new();

    let body = json!({"tenant_id": app.tenant_id, "from": CUSTOMER_PHONE, "text": ""});
    let response = app
        .send(internal_request("POST", ROUTE, INTERNAL_TOKEN, Some(&body)))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
