// Raw Event Ingestion Operations
//
// Entry points a transport (socket subscription, poller, test harness)
// drives to feed the active session's reconciler. Payloads are the raw
// provider shapes; validation happens at the reconciler boundary.

use axum::{debug_handler, extract::State, http::StatusCode, response::Json};

use crate::http::{error::ApiError, server::EngineServerState};

#[utoipa::path(
    post,
    operation_id = "ingestPendingEvent",
    path = "/events/pending",
    tag = "Events",
    responses(
        (status = 202, description = "Event applied"),
        (status = 400, description = "Malformed event payload"),
        (status = 409, description = "No active watch session"),
    )
)]
/// Ingest Pending Transaction Event
#[debug_handler]
pub async fn ingest_pending(
    State(state): State<EngineServerState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    let session = state.watch_manager.active().ok_or(ApiError::NoActiveWatch)?;
    session.reconciler.on_pending_json(payload)?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    post,
    operation_id = "ingestMinedEvent",
    path = "/events/mined",
    tag = "Events",
    responses(
        (status = 202, description = "Event applied; metadata resolution failures degrade to an unenriched record"),
        (status = 400, description = "Malformed event payload"),
        (status = 409, description = "No active watch session"),
    )
)]
/// Ingest Mined Transaction Event
#[debug_handler]
pub async fn ingest_mined(
    State(state): State<EngineServerState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    let session = state.watch_manager.active().ok_or(ApiError::NoActiveWatch)?;
    session.reconciler.on_mined_json(payload).await?;
    Ok(StatusCode::ACCEPTED)
}
