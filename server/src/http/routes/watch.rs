// Watch Session Management Operations

use alloy::primitives::Address;
use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use watchtower_core::chain::Network;
use watchtower_core::defs::AddressDef;

use crate::http::{error::ApiError, server::EngineServerState};

// ===== TYPES =====

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartWatchRequest {
    /// Address to reconcile activity for, as sender or recipient.
    #[schema(value_type = AddressDef)]
    pub address: Address,

    /// Defaults to the configured network when omitted.
    pub network: Option<Network>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatusResponse {
    #[schema(value_type = AddressDef)]
    pub address: Address,
    pub network: Network,
    /// Number of nonces currently tracked by the session.
    pub tracked: usize,
}

// ===== ROUTE HANDLERS =====

#[utoipa::path(
    post,
    operation_id = "startWatch",
    path = "/watch",
    tag = "Watch",
    request_body = StartWatchRequest,
    responses(
        (status = 201, description = "Watch session started", body = WatchStatusResponse, content_type = "application/json"),
    )
)]
/// Start Watching an Address
///
/// Begins a fresh watch session for the address. Any existing session is
/// torn down and its records are discarded; records never migrate across
/// addresses.
#[debug_handler]
pub async fn start_watch(
    State(state): State<EngineServerState>,
    Json(request): Json<StartWatchRequest>,
) -> impl IntoResponse {
    let session = state
        .watch_manager
        .start_watch(request.address, request.network);

    (
        StatusCode::CREATED,
        Json(WatchStatusResponse {
            address: session.address(),
            network: session.network(),
            tracked: 0,
        }),
    )
}

#[utoipa::path(
    get,
    operation_id = "currentWatch",
    path = "/watch",
    tag = "Watch",
    responses(
        (status = 200, description = "Active watch session", body = WatchStatusResponse, content_type = "application/json"),
        (status = 409, description = "No active watch session"),
    )
)]
/// Current Watch Session
#[debug_handler]
pub async fn current_watch(
    State(state): State<EngineServerState>,
) -> Result<Json<WatchStatusResponse>, ApiError> {
    let session = state.watch_manager.active().ok_or(ApiError::NoActiveWatch)?;

    Ok(Json(WatchStatusResponse {
        address: session.address(),
        network: session.network(),
        tracked: session.reconciler.records().len(),
    }))
}

#[utoipa::path(
    delete,
    operation_id = "stopWatch",
    path = "/watch",
    tag = "Watch",
    responses(
        (status = 204, description = "Watch session stopped"),
        (status = 409, description = "No active watch session"),
    )
)]
/// Stop Watching
///
/// Tears down the active session and discards its in-memory records.
#[debug_handler]
pub async fn stop_watch(State(state): State<EngineServerState>) -> Result<StatusCode, ApiError> {
    if state.watch_manager.stop_watch() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NoActiveWatch)
    }
}
