// Reconciled Record Read Operations

use alloy::primitives::Address;
use axum::{debug_handler, extract::State, response::Json};
use serde::Serialize;
use utoipa::ToSchema;
use watchtower_core::defs::AddressDef;
use watchtower_core::record::TransactionRecord;

use crate::http::{error::ApiError, server::EngineServerState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListResponse {
    #[schema(value_type = AddressDef)]
    pub address: Address,

    /// Reconciled records, newest-touched first.
    pub transactions: Vec<TransactionRecord>,
}

#[utoipa::path(
    get,
    operation_id = "listTransactions",
    path = "/transactions",
    tag = "Transactions",
    responses(
        (status = 200, description = "Ordered reconciled records for the watched address", body = TransactionListResponse, content_type = "application/json"),
        (status = 409, description = "No active watch session"),
    )
)]
/// List Reconciled Transactions
#[debug_handler]
pub async fn list_transactions(
    State(state): State<EngineServerState>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let session = state.watch_manager.active().ok_or(ApiError::NoActiveWatch)?;

    Ok(Json(TransactionListResponse {
        address: session.address(),
        transactions: session.reconciler.records(),
    }))
}
