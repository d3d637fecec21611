//! Shared utilities, configuration, and error handling for Deji
//!
//! This crate provides common functionality used across the Deji services:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Request extractors shared by the domain routers

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;

pub use config::Config;
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
