//! Messaging domain: outbound delivery log, notification preferences, fan-out

pub mod api;
pub mod domain;
pub mod fanout;
pub mod repository;
pub mod sender;

// Re-export domain types at the crate root for convenience
pub use domain::alerts::{compose_low_stock_alert, LowStockItem, LOW_STOCK_ALERT};
pub use domain::entities::{
    channel_for_address, DeliveryChannel, DeliveryFilter, DeliveryRecord, DeliveryStatus,
    NotificationPreference,
};

// Re-export services
pub use fanout::{Notification, NotificationFanout};
pub use sender::{Outbound, OutboundSender, CHAT_REPLY, INVOICE_DISPATCH};

// Re-export repository types
pub use repository::{
    DeliveryLog, InMemoryMessagingStore, MessagingRepositories, PreferenceRepository,
};

// Re-export API types
pub use api::routes;
pub use api::{InternalCaller, InternalToken, MessagingState};
