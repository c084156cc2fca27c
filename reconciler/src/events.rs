use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use watchtower_core::defs::{AddressDef, TxHashDef};
use watchtower_core::record::{TransactionRecord, TransactionStatus};

/// Status-change notification published to presentation subscribers, one per
/// lifecycle transition, shaped for toast-style UIs.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionNotification {
    pub notification_id: String,

    #[schema(value_type = String)]
    pub timestamp: DateTime<Utc>,

    pub nonce: u64,

    #[schema(value_type = Option<TxHashDef>)]
    pub hash: Option<B256>,

    pub status: TransactionStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<TransactionStatus>,

    #[schema(value_type = AddressDef)]
    pub to_address: Address,

    pub value: f64,

    pub asset: String,

    /// Ready-to-render toast line, e.g. `Pending transaction to 0x388c...9297`.
    pub summary: String,
}

impl TransactionNotification {
    pub fn for_transition(
        record: &TransactionRecord,
        previous_status: Option<TransactionStatus>,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            nonce: record.nonce,
            hash: record.hash,
            status: record.status,
            previous_status,
            to_address: record.to_address,
            value: record.value,
            asset: record.asset.clone(),
            summary: summary_line(record.status, &record.to_address),
        }
    }
}

fn summary_line(status: TransactionStatus, to: &Address) -> String {
    let header = match status {
        TransactionStatus::Pending => "Pending transaction",
        TransactionStatus::Sent => "Confirmed transaction",
        TransactionStatus::Received => "Received transaction",
        TransactionStatus::Cancelled => "Cancelled transaction",
    };
    format!("{header} to {}", truncate_address(to))
}

/// First six characters and last four, the usual wallet display shorthand.
fn truncate_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
