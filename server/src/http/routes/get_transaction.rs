// Transfer Lookup Proxy
//
// The same lookup the reconciler performs for mined events, exposed over
// HTTP so dashboards can enrich rows on their own schedule. Shares the
// transfers cache with the reconciler path.

use alchemy_core::transfers::AssetTransfersResult;
use alloy::primitives::{Address, U64};
use axum::{debug_handler, extract::State, response::Json};
use serde::Deserialize;
use utoipa::ToSchema;
use watchtower_core::chain::Network;
use watchtower_core::defs::{AddressDef, QuantityDef};
use watchtower_core::resolver::TransferQuery;

use crate::http::{error::ApiError, server::EngineServerState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionRequest {
    #[schema(value_type = AddressDef)]
    pub from_address: Address,

    #[schema(value_type = AddressDef)]
    pub to_address: Address,

    /// Defaults to the configured network when omitted.
    #[serde(default)]
    pub chain: Option<Network>,

    /// Block the transaction was mined in, hex "quantity" encoded.
    #[schema(value_type = QuantityDef)]
    pub block_number: U64,
}

#[utoipa::path(
    post,
    operation_id = "getTransaction",
    path = "/getTransaction",
    tag = "Transfers",
    request_body = GetTransactionRequest,
    responses(
        (status = 200, description = "Matching transfers for the block; the list is empty when none matched", body = AssetTransfersResult, content_type = "application/json"),
        (status = 502, description = "Provider lookup failed"),
    )
)]
/// Look Up Transfer Metadata
#[debug_handler]
pub async fn get_transaction(
    State(state): State<EngineServerState>,
    Json(request): Json<GetTransactionRequest>,
) -> Result<Json<AssetTransfersResult>, ApiError> {
    let network = request
        .chain
        .unwrap_or_else(|| state.watch_manager.default_network());

    let query = TransferQuery {
        from_address: request.from_address,
        to_address: request.to_address,
        network,
        block_number: request.block_number.to(),
    };

    let result = state
        .transfers
        .lookup(&query)
        .await
        .map_err(|e| ApiError::Alchemy((*e).clone()))?;

    Ok(Json(result))
}
