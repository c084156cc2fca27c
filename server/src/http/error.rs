use alchemy_core::error::AlchemyError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use watchtower_core::error::{ResolutionErrorKind, WatcherError};

/// HTTP-facing error wrapper: pairs the domain error taxonomy with status
/// codes and a JSON body carrying both the display message and the
/// serializable error details.
pub enum ApiError {
    Watcher(WatcherError),
    Alchemy(AlchemyError),
    /// A session-scoped route was hit with no active watch session.
    NoActiveWatch,
}

impl From<WatcherError> for ApiError {
    fn from(error: WatcherError) -> Self {
        ApiError::Watcher(error)
    }
}

impl From<AlchemyError> for ApiError {
    fn from(error: AlchemyError) -> Self {
        ApiError::Alchemy(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Watcher(error) => {
                let status = watcher_status_code(&error);
                (
                    status,
                    Json(json!({
                        "error": {
                            "message": error.to_string(),
                            "details": error
                        }
                    })),
                )
                    .into_response()
            }
            ApiError::Alchemy(error) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": {
                        "message": error.to_string(),
                        "details": error
                    }
                })),
            )
                .into_response(),
            ApiError::NoActiveWatch => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": {
                        "message": "no active watch session; start one with POST /watch"
                    }
                })),
            )
                .into_response(),
        }
    }
}

fn watcher_status_code(error: &WatcherError) -> StatusCode {
    match error {
        WatcherError::InvalidEvent { .. } => StatusCode::BAD_REQUEST,
        WatcherError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        WatcherError::ResolutionFailed { kind } => match kind {
            ResolutionErrorKind::Http { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ResolutionErrorKind::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        },
        WatcherError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
