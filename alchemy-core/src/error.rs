use serde::{Deserialize, Serialize};
use thiserror::Error;
use watchtower_core::error::{ResolutionErrorKind, WatcherError};

#[derive(Debug, Error, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlchemyError {
    #[error("UrlParseError: {message}")]
    UrlParseError { value: String, message: String },

    #[error("HttpClientBackendError: {message}")]
    HttpClientBackendError { message: String },

    #[error("operation timed out: {message}")]
    TimeoutError { message: String },

    #[error("connection failed: {message}")]
    ConnectError { message: String },

    /// Request-level failure; carries the HTTP status when one was received.
    #[error("request error: {message}")]
    RequestError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },

    /// JSON-RPC error object in the response body.
    #[error("RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("error decoding response body: {message}")]
    DecodeError { message: String },

    /// Response carried neither a result nor an error object.
    #[error("empty RPC response")]
    MissingResult,
}

impl AlchemyError {
    pub fn url(value: String, error: url::ParseError) -> Self {
        Self::UrlParseError {
            value,
            message: error.to_string(),
        }
    }

    pub fn http_client_backend(error: reqwest::Error) -> Self {
        Self::HttpClientBackendError {
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for AlchemyError {
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();

        if error.is_timeout() {
            Self::TimeoutError { message }
        } else if error.is_connect() {
            Self::ConnectError { message }
        } else if error.is_decode() {
            Self::DecodeError { message }
        } else {
            Self::RequestError {
                message,
                status: error.status().map(|s| s.as_u16()),
            }
        }
    }
}

impl From<AlchemyError> for WatcherError {
    fn from(error: AlchemyError) -> Self {
        let kind = match error {
            AlchemyError::UrlParseError { message, .. }
            | AlchemyError::HttpClientBackendError { message }
            | AlchemyError::ConnectError { message } => {
                ResolutionErrorKind::Transport { message }
            }
            AlchemyError::TimeoutError { message } => ResolutionErrorKind::Timeout { message },
            AlchemyError::RequestError {
                message,
                status: Some(status),
            } => ResolutionErrorKind::Http {
                status,
                body: message,
            },
            AlchemyError::RequestError {
                message,
                status: None,
            } => ResolutionErrorKind::Transport { message },
            AlchemyError::RpcError { code, message } => {
                ResolutionErrorKind::Api { code, message }
            }
            AlchemyError::DecodeError { message } => ResolutionErrorKind::Deser { message },
            AlchemyError::MissingResult => ResolutionErrorKind::Deser {
                message: "response carried no result".to_string(),
            },
        };

        WatcherError::ResolutionFailed { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_maps_to_api_kind() {
        let error = AlchemyError::RpcError {
            code: -32600,
            message: "invalid request".to_string(),
        };

        match WatcherError::from(error) {
            WatcherError::ResolutionFailed {
                kind: ResolutionErrorKind::Api { code, .. },
            } => assert_eq!(code, -32600),
            other => panic!("expected Api resolution failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_result_maps_to_deser_kind() {
        assert!(matches!(
            WatcherError::from(AlchemyError::MissingResult),
            WatcherError::ResolutionFailed {
                kind: ResolutionErrorKind::Deser { .. }
            }
        ));
    }
}
