use std::sync::Arc;

use watchtower_core::error::WatcherError;
use watchtower_core::resolver::{ResolvedTransfer, TransferQuery, TransferResolver};

use crate::transfers::{AlchemyTransfersService, AssetTransfer};

/// Production [`TransferResolver`] backed by the provider's transfers API.
#[derive(Clone)]
pub struct AlchemyTransferResolver {
    service: Arc<AlchemyTransfersService>,
}

impl AlchemyTransferResolver {
    pub fn new(service: Arc<AlchemyTransfersService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<AlchemyTransfersService> {
        &self.service
    }
}

impl TransferResolver for AlchemyTransferResolver {
    async fn resolve(
        &self,
        query: &TransferQuery,
    ) -> Result<Option<ResolvedTransfer>, WatcherError> {
        let result = self
            .service
            .lookup(query)
            .await
            .map_err(|e| WatcherError::from((*e).clone()))?;

        Ok(result
            .transfers
            .into_iter()
            .next()
            .map(AssetTransfer::into_resolved))
    }
}
