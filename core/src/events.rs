use alloy::primitives::{Address, B256, U64, U256};
use serde::{Deserialize, Serialize};

use crate::defs::{AddressDef, QuantityDef, TxHashDef, U256Def};
use crate::error::WatcherError;

/// Raw payload from the pending-transactions feed, scoped to transactions
/// sent by the watched address. Quantities arrive hex-encoded and are kept
/// that way on the wire types; accessors narrow them for the record layer.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    #[schema(value_type = TxHashDef)]
    pub hash: B256,

    #[schema(value_type = AddressDef)]
    pub from: Address,

    #[schema(value_type = AddressDef)]
    pub to: Address,

    /// Transfer amount in wei.
    #[schema(value_type = U256Def)]
    pub value: U256,

    #[schema(value_type = QuantityDef)]
    pub nonce: U64,
}

impl PendingTransaction {
    /// Parse a raw feed payload, rejecting anything with a missing or
    /// malformed required field.
    pub fn from_json(value: serde_json::Value) -> Result<Self, WatcherError> {
        serde_json::from_value(value).map_err(|e| WatcherError::invalid_event(e.to_string()))
    }

    pub fn nonce(&self) -> u64 {
        self.nonce.to()
    }
}

/// Raw payload from the mined-transactions feed. The feed is subscribed for
/// the watched address as sender or recipient, so `from` may be a
/// counterparty.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinedTransactionEvent {
    /// Set by providers when a previously-delivered transaction was dropped
    /// from the canonical chain in a reorg.
    #[serde(default)]
    pub removed: bool,

    pub transaction: MinedTransaction,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinedTransaction {
    #[schema(value_type = QuantityDef)]
    pub block_number: U64,

    #[serde(default)]
    #[schema(value_type = Option<TxHashDef>)]
    pub hash: Option<B256>,

    #[schema(value_type = AddressDef)]
    pub from: Address,

    #[schema(value_type = AddressDef)]
    pub to: Address,

    #[schema(value_type = QuantityDef)]
    pub nonce: U64,
}

impl MinedTransactionEvent {
    pub fn from_json(value: serde_json::Value) -> Result<Self, WatcherError> {
        serde_json::from_value(value).map_err(|e| WatcherError::invalid_event(e.to_string()))
    }
}

impl MinedTransaction {
    pub fn nonce(&self) -> u64 {
        self.nonce.to()
    }

    pub fn block_number(&self) -> u64 {
        self.block_number.to()
    }
}

/// Unified event type for transports that deliver both feeds down one pipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum Event {
    Pending(PendingTransaction),
    Mined(MinedTransactionEvent),
}
