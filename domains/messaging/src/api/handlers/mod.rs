//! API handlers for the Messaging domain

pub mod deliveries;
pub mod notifications;
pub mod preferences;
