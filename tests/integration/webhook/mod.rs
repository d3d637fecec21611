//! Webhook verification and ingestion tests

use axum::{body::Body, http::Request, http::StatusCode};
use deji_messaging::{DeliveryStatus, CHAT_REPLY};
use deji_speech::mock::MockTranscription;
use rust_decimal::Decimal;
use serde_json::json;

use crate::common::{
    body_bytes, message_payload, sign, status_payload, text_message, webhook_request, TestApp,
    ADMIN_PHONE, CUSTOMER_PHONE, VERIFY_TOKEN,
};

fn verify_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/v1/whatsapp/webhook?{}", query))
        .body(Body::empty())
        .unwrap()
}

fn payload_bytes(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

mod test_verification {
    use super::*;

    #[tokio::test]
    async fn test_matching_token_echoes_challenge() {
        let app = TestApp::new();

        let response = app
            .send(verify_request(&format!(
                "hub.mode=subscribe&hub.verify_token={}&hub.challenge=1158201444",
                VERIFY_TOKEN
            )))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"1158201444");
    }

    #[tokio::test]
    async fn test_wrong_token_is_forbidden_without_echo() {
        let app = TestApp::new();

        let response = app
            .send(verify_request(
                "hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1158201444",
            ))
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(!body.contains("1158201444"));
    }

    #[tokio::test]
    async fn test_wrong_mode_is_forbidden() {
        let app = TestApp::new();

        let response = app
            .send(verify_request(&format!(
                "hub.mode=unsubscribe&hub.verify_token={}&hub.challenge=42",
                VERIFY_TOKEN
            )))
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

mod test_ingestion {
    use super::*;

    #[tokio::test]
    async fn test_non_json_body_is_rejected() {
        let app = TestApp::new();

        let response = app.send(webhook_request(b"not json".to_vec(), None)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_body_without_entry_is_rejected() {
        let app = TestApp::new();

        let response = app
            .send(webhook_request(payload_bytes(&json!({"object": "x"})), None))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unrecognised_shape_is_acknowledged() {
        let app = TestApp::new();

        let response = app
            .send(webhook_request(payload_bytes(&json!({"entry": "oops"})), None))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_price_question_is_answered() {
        let mut app = TestApp::new();
        app.store
            .add_product(app.tenant_id, "Widget", Decimal::new(1500, 0), 12);

        let response = app
            .send(webhook_request(
                payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.in-1", "how much is widget")),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        app.settle().await;

        let sent = app.whatsapp.messages_to(CUSTOMER_PHONE);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "Widget costs 1500 ₦");
        assert_eq!(app.llm.call_count(), 0);

        let records = app.messaging.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, CHAT_REPLY);
        assert_eq!(records[0].status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_admin_deliver_all_converges() {
        let mut app = TestApp::new();
        for id in 1..=2 {
            app.store.add_invoice(deji_assistant::Invoice {
                id,
                tenant_id: app.tenant_id,
                number: None,
                customer_name: None,
                status: "PENDING".to_string(),
                total: Decimal::ZERO,
            });
        }

        app.send(webhook_request(
            payload_bytes(&text_message(ADMIN_PHONE, "wamid.cmd-1", "#deliver all")),
            None,
        ))
        .await;
        app.send(webhook_request(
            payload_bytes(&text_message(ADMIN_PHONE, "wamid.cmd-2", "#deliver all")),
            None,
        ))
        .await;
        app.settle().await;

        let mut bodies: Vec<String> = app
            .whatsapp
            .messages_to(ADMIN_PHONE)
            .into_iter()
            .map(|m| m.body)
            .collect();
        bodies.sort();
        assert_eq!(
            bodies,
            vec![
                "✅ Marked 0 pending invoice(s) as DELIVERED.".to_string(),
                "✅ Marked 2 pending invoice(s) as DELIVERED.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_redelivered_message_is_answered_once() {
        let mut app = TestApp::new();
        let body = payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.dup", "hello"));

        for _ in 0..3 {
            let response = app.send(webhook_request(body.clone(), None)).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        app.settle().await;

        assert_eq!(app.whatsapp.sent_count(), 1);
        assert_eq!(app.llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_channel_account_is_silent() {
        let mut app = TestApp::new();
        let mut payload = text_message(CUSTOMER_PHONE, "wamid.x", "hello");
        payload["entry"][0]["changes"][0]["value"]["metadata"]["phone_number_id"] = json!("999");

        let response = app.send(webhook_request(payload_bytes(&payload), None)).await;
        app.settle().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.whatsapp.sent_count(), 0);
        assert!(app.messaging.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_voice_note_gets_one_apology() {
        let mut app = TestApp::new();
        app.whatsapp
            .add_media("media-7", Some("audio/ogg"), vec![1u8, 2, 3]);
        app.speech.set_outcome(MockTranscription::Fail);

        let payload = message_payload(json!({
            "from": CUSTOMER_PHONE,
            "id": "wamid.voice",
            "type": "audio",
            "audio": {"id": "media-7", "mime_type": "audio/ogg"}
        }));
        app.send(webhook_request(payload_bytes(&payload), None)).await;
        app.settle().await;

        let sent = app.whatsapp.messages_to(CUSTOMER_PHONE);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "⚠️ Could not transcribe your voice note.");
        assert_eq!(app.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_voice_note_without_media_gets_apology() {
        let mut app = TestApp::new();
        let payload = message_payload(json!({
            "from": CUSTOMER_PHONE,
            "id": "wamid.voice-empty",
            "type": "audio",
            "audio": {}
        }));

        let response = app.send(webhook_request(payload_bytes(&payload), None)).await;
        app.settle().await;

        assert_eq!(response.status(), StatusCode::OK);
        let sent = app.whatsapp.messages_to(CUSTOMER_PHONE);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "⚠️ Could not transcribe your voice note.");
        assert!(app.speech.calls().is_empty());
        assert_eq!(app.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_message_gets_fixed_reply() {
        let mut app = TestApp::new();
        let payload = message_payload(json!({
            "from": CUSTOMER_PHONE,
            "id": "wamid.img",
            "type": "image",
            "image": {"id": "img-1"}
        }));

        app.send(webhook_request(payload_bytes(&payload), None)).await;
        app.settle().await;

        let sent = app.whatsapp.messages_to(CUSTOMER_PHONE);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "🤖 I can handle text and voice notes for now.");
    }
}

mod test_signatures {
    use super::*;

    const APP_SECRET: &str = "app-secret";

    fn signed_app() -> TestApp {
        TestApp::with_config(|c| c.whatsapp_app_secret = Some(APP_SECRET.to_string()))
    }

    #[tokio::test]
    async fn test_missing_signature_is_unauthorized() {
        let app = signed_app();
        let body = payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.s1", "hello"));

        let response = app.send(webhook_request(body, None)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_signature_is_unauthorized() {
        let app = signed_app();
        let body = payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.s2", "hello"));
        let signature = sign(&body, "other-secret");

        let response = app.send(webhook_request(body, Some(&signature))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_signature_is_processed() {
        let mut app = signed_app();
        let body = payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.s3", "hello"));
        let signature = sign(&body, APP_SECRET);

        let response = app.send(webhook_request(body, Some(&signature))).await;
        app.settle().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.whatsapp.sent_count(), 1);
    }
}

mod test_status_callbacks {
    use super::*;

    #[tokio::test]
    async fn test_status_moves_forward_only() {
        let mut app = TestApp::new();
        app.send(webhook_request(
            payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.in-9", "hello")),
            None,
        ))
        .await;
        app.settle().await;

        let provider_id = app.messaging.records()[0]
            .provider_message_id
            .clone()
            .unwrap();

        let response = app
            .send(webhook_request(
                payload_bytes(&status_payload(&provider_id, "read")),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.messaging.records()[0].status, DeliveryStatus::Read);

        app.send(webhook_request(
            payload_bytes(&status_payload(&provider_id, "delivered")),
            None,
        ))
        .await;
        assert_eq!(app.messaging.records()[0].status, DeliveryStatus::Read);
    }

    #[tokio::test]
    async fn test_unknown_message_id_is_ignored() {
        let app = TestApp::new();

        let response = app
            .send(webhook_request(
                payload_bytes(&status_payload("wamid.unknown", "delivered")),
                None,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.messaging.records().is_empty());
    }

    #[tokio::test]
    async fn test_status_ahead_of_reply_record_is_applied() {
        let mut app = TestApp::new();
        // First id the mock provider hands out
        app.send(webhook_request(
            payload_bytes(&status_payload("wamid.mock-1", "delivered")),
            None,
        ))
        .await;
        assert!(app.messaging.records().is_empty());

        app.send(webhook_request(
            payload_bytes(&text_message(CUSTOMER_PHONE, "wamid.in-10", "hello")),
            None,
        ))
        .await;
        app.settle().await;

        let records = app.messaging.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].provider_message_id.as_deref(), Some("wamid.mock-1"));
        assert_eq!(records[0].status, DeliveryStatus::Delivered);
    }
}
