//! Route definitions for Messaging domain API
//!
//! Every route here is internal: callers authenticate with `x-internal-token`.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{deliveries, notifications, preferences};
use super::middleware::MessagingState;

/// Business-event entry points for the fan-out
fn notification_routes() -> Router<MessagingState> {
    Router::new()
        .route(
            "/v1/internal/notifications",
            post(notifications::send_notification),
        )
        .route(
            "/v1/internal/notifications/low-stock",
            post(notifications::send_low_stock_alert),
        )
        .route(
            "/v1/internal/notifications/preferences/{tenant_id}",
            get(preferences::get_preferences).put(preferences::put_preferences),
        )
}

fn delivery_routes() -> Router<MessagingState> {
    Router::new().route("/v1/internal/deliveries", get(deliveries::list_deliveries))
}

/// Create all Messaging domain API routes
pub fn routes() -> Router<MessagingState> {
    Router::new()
        .merge(notification_routes())
        .merge(delivery_routes())
}
