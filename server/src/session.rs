use std::sync::{Arc, RwLock};
use std::time::Duration;

use alchemy_core::resolver::AlchemyTransferResolver;
use alloy::primitives::Address;
use watchtower_core::chain::Network;
use watchtower_reconciler::EventReconciler;

/// One active watch: a reconciler bound to an address/network pair for the
/// lifetime of the session.
pub struct WatchSession {
    pub reconciler: EventReconciler<AlchemyTransferResolver>,
}

impl WatchSession {
    pub fn address(&self) -> Address {
        self.reconciler.watched_address()
    }

    pub fn network(&self) -> Network {
        self.reconciler.network()
    }
}

/// Owns the resolver and at most one active watch session.
///
/// Switching the watched address constructs a fresh reconciler and drops the
/// previous session wholesale; records never migrate across addresses.
pub struct WatchManager {
    resolver: Arc<AlchemyTransferResolver>,
    default_network: Network,
    resolve_timeout: Duration,
    active: RwLock<Option<Arc<WatchSession>>>,
}

impl WatchManager {
    pub fn new(
        resolver: Arc<AlchemyTransferResolver>,
        default_network: Network,
        resolve_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            default_network,
            resolve_timeout,
            active: RwLock::new(None),
        }
    }

    pub fn default_network(&self) -> Network {
        self.default_network
    }

    /// Begin watching `address`, tearing down any existing session.
    pub fn start_watch(&self, address: Address, network: Option<Network>) -> Arc<WatchSession> {
        let network = network.unwrap_or(self.default_network);
        let reconciler = EventReconciler::new(address, network, self.resolver.clone())
            .with_resolve_timeout(self.resolve_timeout);
        let session = Arc::new(WatchSession { reconciler });

        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.replace(session.clone()) {
            tracing::info!(
                address = %previous.address(),
                "Discarding previous watch session"
            );
        }
        tracing::info!(address = %address, network = %network, "Watch session started");

        session
    }

    /// Tear down the active session, if any. Returns whether one existed.
    pub fn stop_watch(&self) -> bool {
        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        match active.take() {
            Some(previous) => {
                tracing::info!(address = %previous.address(), "Watch session stopped");
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> Option<Arc<WatchSession>> {
        self.active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alchemy_core::transfers::AlchemyTransfersServiceBuilder;
    use alloy::primitives::address;

    fn manager() -> WatchManager {
        let service = AlchemyTransfersServiceBuilder::new("test-key")
            .build()
            .unwrap();
        WatchManager::new(
            Arc::new(AlchemyTransferResolver::new(Arc::new(service))),
            Network::EthMainnet,
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_start_watch_replaces_previous_session() {
        let manager = manager();
        let first = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let second = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

        manager.start_watch(first, None);
        manager.start_watch(second, Some(Network::MaticMainnet));

        let active = manager.active().unwrap();
        assert_eq!(active.address(), second);
        assert_eq!(active.network(), Network::MaticMainnet);
    }

    #[test]
    fn test_session_reset_discards_records() {
        let manager = manager();
        let address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

        let session = manager.start_watch(address, None);
        session.reconciler.on_pending(
            watchtower_core::events::PendingTransaction::from_json(serde_json::json!({
                "hash": "0x2a47cdb2bae8fcdb8364bdfb202ab0e1c7f6ab9f0e0f75bb14b9b0fd0bbd7a71",
                "from": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                "to": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
                "value": "0x5",
                "nonce": "0x1"
            }))
            .unwrap(),
        );
        assert_eq!(session.reconciler.records().len(), 1);

        let fresh = manager.start_watch(address, None);
        assert!(fresh.reconciler.records().is_empty());
    }

    #[test]
    fn test_stop_watch() {
        let manager = manager();
        assert!(!manager.stop_watch());

        manager.start_watch(address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"), None);
        assert!(manager.stop_watch());
        assert!(manager.active().is_none());
    }
}
