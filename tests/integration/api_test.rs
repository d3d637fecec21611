//! API endpoint integration tests
//!
//! Webhook ingestion, chatbot preview and internal notification routes,
//! exercised through the composed router.

#![allow(dead_code)]

mod chatbot;
mod common;
mod notifications;
mod webhook;
