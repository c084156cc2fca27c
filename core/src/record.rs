use std::fmt::Display;

use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNRESOLVED_ASSET;
use crate::defs::{AddressDef, TxHashDef};
use crate::events::PendingTransaction;
use crate::resolver::{ResolvedTransfer, TransferCategory};

/// Lifecycle state of a tracked transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Sent,
    Received,
    Cancelled,
}

impl TransactionStatus {
    /// Status outcome for a mined event, given the record's prior status (if
    /// any) and whether the watched address is the sender. Cancelled is
    /// sticky: mined data enriches fields but never revives a replaced
    /// transaction.
    pub fn on_mined(prior: Option<TransactionStatus>, outgoing: bool) -> TransactionStatus {
        match (prior, outgoing) {
            (Some(TransactionStatus::Cancelled), _) => TransactionStatus::Cancelled,
            (_, true) => TransactionStatus::Sent,
            (None, false) => TransactionStatus::Received,
            (Some(prior), false) => prior,
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Sent => write!(f, "Sent"),
            TransactionStatus::Received => write!(f, "Received"),
            TransactionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One tracked transaction, keyed by nonce within a watch session.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub nonce: u64,

    pub status: TransactionStatus,

    #[schema(value_type = AddressDef)]
    pub from_address: Address,

    #[schema(value_type = AddressDef)]
    pub to_address: Address,

    #[schema(value_type = Option<TxHashDef>)]
    pub hash: Option<B256>,

    /// Amount denominated in `asset`. Raw wei until metadata resolves.
    pub value: f64,

    pub asset: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TransferCategory>,

    /// Block time, absent until the mined event's metadata resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// Fresh record for a first-seen pending transaction.
    pub fn from_pending(tx: &PendingTransaction) -> Self {
        Self {
            nonce: tx.nonce(),
            status: TransactionStatus::Pending,
            from_address: tx.from,
            to_address: tx.to,
            hash: Some(tx.hash),
            value: wei_to_f64(tx.value),
            asset: UNRESOLVED_ASSET.to_string(),
            category: None,
            timestamp: None,
        }
    }

    /// Skeleton record for a mined transaction with no prior pending
    /// observation. Address and hash fields come from the resolved transfer;
    /// the recipient defaults to `fallback_to` (the watched address) when
    /// the provider omits it.
    pub fn from_transfer(
        nonce: u64,
        status: TransactionStatus,
        transfer: &ResolvedTransfer,
        fallback_to: Address,
    ) -> Self {
        Self {
            nonce,
            status,
            from_address: transfer.from,
            to_address: transfer.to.unwrap_or(fallback_to),
            hash: transfer.hash,
            value: 0.0,
            asset: UNRESOLVED_ASSET.to_string(),
            category: None,
            timestamp: None,
        }
    }

    /// Enrich detail fields from a resolved transfer. Status and the
    /// original addresses are never touched here.
    pub fn merge_transfer(&mut self, transfer: &ResolvedTransfer) {
        if let Some(value) = transfer.value {
            self.value = value;
        }
        if let Some(asset) = &transfer.asset {
            self.asset = asset.clone();
        }
        self.category = Some(transfer.category);
        if let Some(timestamp) = transfer.block_timestamp {
            self.timestamp = Some(timestamp);
        }
        if self.hash.is_none() {
            self.hash = transfer.hash;
        }
    }
}

/// Wei quantities exceed u64, so widen through the decimal string. Amounts
/// are display data; the precision loss matches the provider's own decimal
/// values.
fn wei_to_f64(value: U256) -> f64 {
    value.to_string().parse().unwrap_or_default()
}
