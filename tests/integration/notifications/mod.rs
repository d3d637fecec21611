//! Internal notification, preference and delivery-log routes

use axum::http::StatusCode;
use deji_messaging::{NotificationPreference, LOW_STOCK_ALERT};
use serde_json::json;
use uuid::Uuid;

use crate::common::{body_json, internal_request, TestApp, INTERNAL_TOKEN};

fn enable(app: &TestApp, tenant_id: Uuid, by_email: bool, by_whatsapp: bool) {
    app.messaging.set_preference(NotificationPreference {
        tenant_id,
        notify_by_email: by_email,
        notify_by_whatsapp: by_whatsapp,
    });
}

mod test_authentication {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new();

        let response = app
            .send(
                axum::http::Request::builder()
                    .method("GET")
                    .uri(format!("/v1/internal/deliveries?tenant_id={}", app.tenant_id))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let app = TestApp::new();

        let response = app
            .send(internal_request(
                "GET",
                &format!("/v1/internal/deliveries?tenant_id={}", app.tenant_id),
                "wrong-token",
                None,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_routes_absent_without_configured_token() {
        let app = TestApp::with_config(|c| c.internal_api_token = None);

        let response = app
            .send(internal_request(
                "GET",
                &format!("/v1/internal/deliveries?tenant_id={}", app.tenant_id),
                INTERNAL_TOKEN,
                None,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod test_preferences {
    use super::*;

    #[tokio::test]
    async fn test_missing_preferences_are_not_found() {
        let app = TestApp::new();

        let response = app
            .send(internal_request(
                "GET",
                &format!("/v1/internal/notifications/preferences/{}", app.tenant_id),
                INTERNAL_TOKEN,
                None,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let app = TestApp::new();
        let uri = format!("/v1/internal/notifications/preferences/{}", app.tenant_id);

        let put = app
            .send(internal_request(
                "PUT",
                &uri,
                INTERNAL_TOKEN,
                Some(&json!({"notify_by_email": false, "notify_by_whatsapp": true})),
            ))
            .await;
        assert_eq!(put.status(), StatusCode::OK);

        let get = app
            .send(internal_request("GET", &uri, INTERNAL_TOKEN, None))
            .await;
        let body = body_json(get).await;
        assert_eq!(body["notify_by_email"], false);
        assert_eq!(body["notify_by_whatsapp"], true);
    }
}

mod test_fanout {
    use super::*;

    #[tokio::test]
    async fn test_notification_follows_preferences() {
        let app = TestApp::new();
        enable(&app, app.tenant_id, true, false);

        let email = app
            .send(internal_request(
                "POST",
                "/v1/internal/notifications",
                INTERNAL_TOKEN,
                Some(&json!({
                    "tenant_id": app.tenant_id,
                    "category": "PAYMENT_RECEIVED",
                    "recipient": "owner@example.com",
                    "content": "Payment of 5000 received"
                })),
            ))
            .await;
        assert_eq!(email.status(), StatusCode::OK);
        let body = body_json(email).await;
        assert_eq!(body["deliveries"].as_array().unwrap().len(), 1);
        assert_eq!(body["deliveries"][0]["channel"], "email");
        assert_eq!(body["deliveries"][0]["status"], "SENT");

        let whatsapp = app
            .send(internal_request(
                "POST",
                "/v1/internal/notifications",
                INTERNAL_TOKEN,
                Some(&json!({
                    "tenant_id": app.tenant_id,
                    "category": "PAYMENT_RECEIVED",
                    "recipient": "+2348000000005",
                    "content": "Payment of 5000 received"
                })),
            ))
            .await;
        let body = body_json(whatsapp).await;
        assert!(body["deliveries"].as_array().unwrap().is_empty());

        assert_eq!(app.email.email_count(), 1);
        assert_eq!(app.whatsapp.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_no_preferences_sends_nothing() {
        let app = TestApp::new();

        let response = app
            .send(internal_request(
                "POST",
                "/v1/internal/notifications",
                INTERNAL_TOKEN,
                Some(&json!({
                    "tenant_id": app.tenant_id,
                    "category": "PAYMENT_RECEIVED",
                    "recipient": "owner@example.com",
                    "content": "hello"
                })),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.email.email_count(), 0);
        assert!(app.messaging.records().is_empty());
    }

    #[tokio::test]
    async fn test_low_stock_alert_reaches_every_recipient() {
        let app = TestApp::new();
        enable(&app, app.tenant_id, true, true);

        let response = app
            .send(internal_request(
                "POST",
                "/v1/internal/notifications/low-stock",
                INTERNAL_TOKEN,
                Some(&json!({
                    "tenant_id": app.tenant_id,
                    "recipients": ["owner@example.com", "+2348000000005"],
                    "products": [
                        {"name": "Rice", "stock": 2, "low_stock_threshold": 5},
                        {"name": "Beans", "stock": 0}
                    ]
                })),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let emails = app.email.get_emails_for_recipient("owner@example.com");
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].category(), Some(LOW_STOCK_ALERT));

        let sent = app.whatsapp.messages_to("+2348000000005");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("Product: Rice"));
        assert!(sent[0].body.contains("Product: Beans\nStock Left: 0\nThreshold: 5"));
    }

    #[tokio::test]
    async fn test_low_stock_alert_requires_recipients() {
        let app = TestApp::new();

        let response = app
            .send(internal_request(
                "POST",
                "/v1/internal/notifications/low-stock",
                INTERNAL_TOKEN,
                Some(&json!({"tenant_id": app.tenant_id, "recipients": [], "products": []})),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_delivery_log {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_by_channel() {
        let app = TestApp::new();
        enable(&app, app.tenant_id, true, true);

        for recipient in ["owner@example.com", "+2348000000005"] {
            app.send(internal_request(
                "POST",
                "/v1/internal/notifications",
                INTERNAL_TOKEN,
                Some(&json!({
                    "tenant_id": app.tenant_id,
                    "category": "PAYMENT_RECEIVED",
                    "recipient": recipient,
                    "content": "Payment received"
                })),
            ))
            .await;
        }

        let all = body_json(
            app.send(internal_request(
                "GET",
                &format!("/v1/internal/deliveries?tenant_id={}", app.tenant_id),
                INTERNAL_TOKEN,
                None,
            ))
            .await,
        )
        .await;
        assert_eq!(all["data"].as_array().unwrap().len(), 2);
        assert_eq!(all["meta"]["limit"], 50);

        let whatsapp_only = body_json(
            app.send(internal_request(
                "GET",
                &format!(
                    "/v1/internal/deliveries?tenant_id={}&channel=whatsapp&limit=500",
                    app.tenant_id
                ),
                INTERNAL_TOKEN,
                None,
            ))
            .await,
        )
        .await;
        let data = whatsapp_only["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["recipient"], "+2348000000005");
        assert_eq!(whatsapp_only["meta"]["limit"], 200);
    }
}
