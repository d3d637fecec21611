//! API handlers for the Assistant domain

pub mod chatbot;
pub mod webhook;
