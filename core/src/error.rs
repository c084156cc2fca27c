use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error taxonomy for the watcher engine.
///
/// Serializable so failures can travel through API responses and
/// notification payloads without losing their shape.
#[derive(Debug, Error, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatcherError {
    /// Malformed pending/mined payload. The offending event is rejected
    /// and reconciler state is left untouched.
    #[error("invalid event payload: {message}")]
    InvalidEvent { message: String },

    /// Transfer metadata lookup failed (network, HTTP, provider or
    /// decoding problem). Merges degrade to a no-op enrichment.
    #[error("transfer resolution failed: {kind}")]
    ResolutionFailed { kind: ResolutionErrorKind },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("internal error: {message}")]
    InternalError { message: String },
}

#[derive(Debug, Error, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionErrorKind {
    /// Provider returned a non-success HTTP status.
    #[error("HTTP error {status}")]
    Http { status: u16, body: String },

    /// Provider returned a JSON-RPC error response.
    #[error("provider error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// Response body could not be decoded.
    #[error("deserialization error: {message}")]
    Deser { message: String },

    /// The lookup exceeded its deadline.
    #[error("lookup timed out: {message}")]
    Timeout { message: String },

    /// Connection-level failure before any response arrived.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl WatcherError {
    pub fn invalid_event(message: impl Into<String>) -> Self {
        WatcherError::InvalidEvent {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WatcherError::ValidationError {
            message: message.into(),
        }
    }
}
