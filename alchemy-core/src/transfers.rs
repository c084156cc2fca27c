use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use watchtower_core::chain::Network;
use watchtower_core::defs::{AddressDef, TxHashDef};
use watchtower_core::resolver::{ResolvedTransfer, TransferCategory, TransferQuery};

use crate::error::AlchemyError;

/// Domain the per-network subdomains hang off, e.g.
/// `https://eth-mainnet.g.alchemy.com/v2/{key}`.
pub const DEFAULT_BASE_DOMAIN: &str = "g.alchemy.com";

const GET_ASSET_TRANSFERS_METHOD: &str = "alchemy_getAssetTransfers";

/// Parameter object for `alchemy_getAssetTransfers`. Block tags and the max
/// count are hex "quantity" strings on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersParams {
    pub from_block: String,
    pub to_block: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<Address>,

    pub category: Vec<TransferCategory>,
    pub max_count: String,
    pub exclude_zero_value: bool,
    pub with_metadata: bool,
}

impl AssetTransfersParams {
    /// The lookup the reconciler needs: the first transfer of any category
    /// between `from` and `to` within the exact mined block.
    pub fn for_block(block_number: u64, from: Address, to: Address) -> Self {
        Self {
            from_block: format!("{block_number:#x}"),
            to_block: format!("{block_number:#x}"),
            from_address: Some(from),
            to_address: Some(to),
            category: vec![
                TransferCategory::External,
                TransferCategory::Internal,
                TransferCategory::Erc20,
                TransferCategory::Erc721,
                TransferCategory::Erc1155,
            ],
            max_count: "0x1".to_string(),
            exclude_zero_value: false,
            with_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersResult {
    pub transfers: Vec<AssetTransfer>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

/// One transfer as the provider reports it. NFT transfers carry no decimal
/// value and some categories omit the hash, hence the optionals.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    pub category: TransferCategory,

    #[serde(default)]
    pub block_num: Option<String>,

    #[schema(value_type = AddressDef)]
    pub from: Address,

    #[schema(value_type = Option<AddressDef>)]
    pub to: Option<Address>,

    #[serde(default)]
    pub value: Option<f64>,

    #[serde(default)]
    pub asset: Option<String>,

    #[serde(default)]
    #[schema(value_type = Option<TxHashDef>)]
    pub hash: Option<B256>,

    #[serde(default)]
    pub unique_id: Option<String>,

    #[serde(default)]
    pub metadata: Option<TransferMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferMetadata {
    #[schema(value_type = String)]
    pub block_timestamp: DateTime<Utc>,
}

impl AssetTransfer {
    pub fn into_resolved(self) -> ResolvedTransfer {
        ResolvedTransfer {
            asset: self.asset,
            value: self.value,
            category: self.category,
            from: self.from,
            to: self.to,
            hash: self.hash,
            block_timestamp: self.metadata.map(|m| m.block_timestamp),
        }
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: [T; 1],
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Client for the provider's transfers API, fronted by an in-process cache.
/// Mined transfers are immutable, so cached responses only expire to bound
/// memory.
pub struct AlchemyTransfersService {
    pub base_domain: String,
    pub client: reqwest::Client,
    pub cache: moka::future::Cache<TransferQuery, AssetTransfersResult>,
    api_key: String,
}

pub struct AlchemyTransfersServiceBuilder {
    pub api_key: String,
    pub base_domain: String,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl AlchemyTransfersServiceBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            cache_ttl: Duration::from_secs(60 * 60),
            cache_capacity: 1_000,
        }
    }

    pub fn with_base_domain(mut self, base_domain: impl Into<String>) -> Self {
        self.base_domain = base_domain.into();
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: u64) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    pub fn build(self) -> Result<AlchemyTransfersService, AlchemyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(AlchemyError::http_client_backend)?;

        let cache = moka::future::Cache::builder()
            .max_capacity(self.cache_capacity)
            .time_to_live(self.cache_ttl)
            .build();

        Ok(AlchemyTransfersService {
            client,
            cache,
            base_domain: self.base_domain,
            api_key: self.api_key,
        })
    }
}

impl AlchemyTransfersService {
    fn endpoint(&self, network: Network) -> Result<Url, AlchemyError> {
        let raw = format!(
            "https://{}.{}/v2/{}",
            network.slug(),
            self.base_domain,
            self.api_key
        );
        Url::parse(&raw).map_err(|e| AlchemyError::url(raw.clone(), e))
    }

    /// Uncached `alchemy_getAssetTransfers` call.
    pub async fn get_asset_transfers(
        &self,
        network: Network,
        params: AssetTransfersParams,
    ) -> Result<AssetTransfersResult, AlchemyError> {
        let url = self.endpoint(network)?;
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: GET_ASSET_TRANSFERS_METHOD,
            params: [params],
        };

        let response = self.client.post(url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlchemyError::RequestError {
                message: body,
                status: Some(status.as_u16()),
            });
        }

        let envelope = response
            .json::<JsonRpcResponse<AssetTransfersResult>>()
            .await?;

        if let Some(error) = envelope.error {
            return Err(AlchemyError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        envelope.result.ok_or(AlchemyError::MissingResult)
    }

    /// Cached lookup for a reconciler query. Concurrent lookups for the same
    /// key coalesce into a single provider call.
    pub async fn lookup(
        &self,
        query: &TransferQuery,
    ) -> Result<AssetTransfersResult, Arc<AlchemyError>> {
        tracing::debug!(
            block_number = query.block_number,
            network = %query.network,
            "Looking up asset transfers"
        );
        self.cache
            .try_get_with(query.clone(), async {
                let params = AssetTransfersParams::for_block(
                    query.block_number,
                    query.from_address,
                    query.to_address,
                );
                self.get_asset_transfers(query.network, params).await
            })
            .await
    }

    pub async fn get_from_cache(&self, query: &TransferQuery) -> Option<AssetTransfersResult> {
        self.cache.get(query).await
    }
}
