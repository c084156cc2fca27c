use std::future::Future;

use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::Network;
use crate::defs::{AddressDef, TxHashDef};
use crate::error::WatcherError;

/// Lookup key for a mined transaction's transfer metadata: the exact block
/// plus the (from, to) pair the feed reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferQuery {
    pub from_address: Address,
    pub to_address: Address,
    pub network: Network,
    pub block_number: u64,
}

/// Transfer classification reported by the metadata provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TransferCategory {
    External,
    Internal,
    Erc20,
    Erc721,
    Erc1155,
    SpecialNft,
}

/// Enriched transfer data for a mined transaction. Provider responses omit
/// fields for some transfer kinds (NFT transfers carry no decimal value,
/// internal transfers no hash), so most fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransfer {
    pub asset: Option<String>,

    /// Amount denominated in `asset`, already converted to decimal units by
    /// the provider.
    pub value: Option<f64>,

    pub category: TransferCategory,

    #[schema(value_type = AddressDef)]
    pub from: Address,

    #[schema(value_type = Option<AddressDef>)]
    pub to: Option<Address>,

    #[schema(value_type = Option<TxHashDef>)]
    pub hash: Option<B256>,

    #[schema(value_type = Option<String>)]
    pub block_timestamp: Option<DateTime<Utc>>,
}

/// Seam to the metadata lookup service. `Ok(None)` is the not-found
/// outcome: the provider answered but no transfer matched the query.
pub trait TransferResolver: Send + Sync {
    fn resolve(
        &self,
        query: &TransferQuery,
    ) -> impl Future<Output = Result<Option<ResolvedTransfer>, WatcherError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_uses_provider_names() {
        assert_eq!(
            serde_json::to_string(&TransferCategory::Erc1155).unwrap(),
            "\"erc1155\""
        );
        let category: TransferCategory = serde_json::from_str("\"specialnft\"").unwrap();
        assert_eq!(category, TransferCategory::SpecialNft);
    }
}
