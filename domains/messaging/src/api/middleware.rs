//! Messaging domain state and internal-caller authentication

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use deji_common::Error;

use crate::fanout::NotificationFanout;
use crate::repository::MessagingRepositories;

/// Header carrying the shared secret of internal callers
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Shared secret expected from internal callers
#[derive(Clone)]
pub struct InternalToken(Arc<str>);

impl InternalToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        expected.len() == presented.len()
            && expected
                .iter()
                .zip(presented)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

impl std::fmt::Debug for InternalToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InternalToken([REDACTED])")
    }
}

/// Application state for the Messaging domain
#[derive(Clone)]
pub struct MessagingState {
    pub repos: MessagingRepositories,
    pub fanout: Arc<NotificationFanout>,
    pub internal_token: InternalToken,
}

impl FromRef<MessagingState> for InternalToken {
    fn from_ref(state: &MessagingState) -> Self {
        state.internal_token.clone()
    }
}

/// Proof that the request carried the internal token
#[derive(Debug)]
pub struct InternalCaller;

impl<S> FromRequestParts<S> for InternalCaller
where
    InternalToken: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let expected = InternalToken::from_ref(state);

        let presented = parts
            .headers
            .get(INTERNAL_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Authentication("Missing internal token".to_string()))?;

        if !expected.matches(presented) {
            tracing::warn!("Rejected internal request with invalid token");
            return Err(Error::Authentication("Invalid internal token".to_string()));
        }

        Ok(InternalCaller)
    }
}
