//! Domain layer for Messaging

pub mod alerts;
pub mod entities;
