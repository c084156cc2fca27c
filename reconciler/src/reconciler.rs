use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tokio::sync::{broadcast, watch};
use watchtower_core::chain::Network;
use watchtower_core::constants::{DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_RESOLVE_TIMEOUT_MS};
use watchtower_core::error::WatcherError;
use watchtower_core::events::{Event, MinedTransactionEvent, PendingTransaction};
use watchtower_core::record::{TransactionRecord, TransactionStatus};
use watchtower_core::resolver::{TransferQuery, TransferResolver};

use crate::events::TransactionNotification;
use crate::store::{PendingOutcome, RecordStore};

/// Reconciles the raw pending/mined feeds for one watched address into a
/// consistent per-nonce record set, enriching mined transactions with
/// resolver metadata.
///
/// One instance per watch session: switching the watched address means
/// constructing a fresh reconciler and dropping this one, so records never
/// leak across addresses.
pub struct EventReconciler<R: TransferResolver> {
    watched: Address,
    network: Network,
    resolver: Arc<R>,
    resolve_timeout: Duration,
    store: RecordStore,
    notifications: broadcast::Sender<TransactionNotification>,
    snapshots: watch::Sender<Vec<TransactionRecord>>,
}

impl<R: TransferResolver> EventReconciler<R> {
    pub fn new(watched: Address, network: Network, resolver: Arc<R>) -> Self {
        let (notifications, _) = broadcast::channel(DEFAULT_NOTIFICATION_CAPACITY);
        let (snapshots, _) = watch::channel(Vec::new());

        Self {
            watched,
            network,
            resolver,
            resolve_timeout: Duration::from_millis(DEFAULT_RESOLVE_TIMEOUT_MS),
            store: RecordStore::new(),
            notifications,
            snapshots,
        }
    }

    pub fn with_resolve_timeout(mut self, resolve_timeout: Duration) -> Self {
        self.resolve_timeout = resolve_timeout;
        self
    }

    pub fn watched_address(&self) -> Address {
        self.watched
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Current record list, newest-touched first.
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.store.snapshot()
    }

    /// Subscribe to per-transition notifications (the toast feed).
    pub fn notifications(&self) -> broadcast::Receiver<TransactionNotification> {
        self.notifications.subscribe()
    }

    /// Subscribe to full ordered-list snapshots, republished on every
    /// mutation (the table feed).
    pub fn snapshots(&self) -> watch::Receiver<Vec<TransactionRecord>> {
        self.snapshots.subscribe()
    }

    /// Dispatch a unified transport event.
    pub async fn apply(&self, event: Event) -> Result<(), WatcherError> {
        match event {
            Event::Pending(tx) => self.on_pending(tx),
            Event::Mined(event) => self.on_mined(event).await,
        }
        Ok(())
    }

    /// Boundary entry point for raw pending payloads; malformed input is
    /// rejected with `InvalidEvent` and leaves state untouched.
    pub fn on_pending_json(&self, payload: serde_json::Value) -> Result<(), WatcherError> {
        let tx = PendingTransaction::from_json(payload)
            .inspect_err(|e| tracing::warn!(error = %e, "Rejected pending event"))?;
        self.on_pending(tx);
        Ok(())
    }

    /// Boundary entry point for raw mined payloads.
    pub async fn on_mined_json(&self, payload: serde_json::Value) -> Result<(), WatcherError> {
        let event = MinedTransactionEvent::from_json(payload)
            .inspect_err(|e| tracing::warn!(error = %e, "Rejected mined event"))?;
        self.on_mined(event).await;
        Ok(())
    }

    /// Apply a pending event: first sighting of a nonce starts tracking it,
    /// a repeat sighting cancels the tracked record (fee-bump or nonce
    /// reuse superseded the original).
    pub fn on_pending(&self, tx: PendingTransaction) {
        match self.store.apply_pending(&tx) {
            PendingOutcome::Inserted(record) => {
                tracing::debug!(
                    nonce = record.nonce,
                    hash = ?record.hash,
                    "Tracking pending transaction"
                );
                self.notify(&record, None);
            }
            PendingOutcome::Cancelled { record, previous } => {
                tracing::info!(
                    nonce = record.nonce,
                    previous = %previous,
                    "Pending collision, marking transaction cancelled"
                );
                self.notify(&record, Some(previous));
            }
            PendingOutcome::AlreadyCancelled => {
                tracing::debug!(
                    nonce = tx.nonce(),
                    "Duplicate pending event for cancelled nonce, ignoring"
                );
                return;
            }
        }
        self.publish();
    }

    /// Apply a mined event. The metadata lookup may suspend; pending/mined
    /// calls for other nonces interleave freely because the merge below
    /// runs against the live store, not a pre-lookup snapshot.
    ///
    /// Resolution failures and misses degrade to a no-op enrichment: the
    /// record (if any) keeps its status and simply stays without detail
    /// fields. Nothing is retried.
    pub async fn on_mined(&self, event: MinedTransactionEvent) {
        let tx = event.transaction;
        if event.removed {
            tracing::debug!(nonce = tx.nonce(), "Mined event flagged removed by provider");
        }

        let query = TransferQuery {
            from_address: tx.from,
            to_address: tx.to,
            network: self.network,
            block_number: tx.block_number(),
        };

        let lookup = tokio::time::timeout(self.resolve_timeout, self.resolver.resolve(&query));
        let transfer = match lookup.await {
            Err(_) => {
                tracing::warn!(
                    nonce = tx.nonce(),
                    timeout_ms = self.resolve_timeout.as_millis() as u64,
                    "Transfer resolution timed out, leaving record unenriched"
                );
                return;
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    nonce = tx.nonce(),
                    error = %error,
                    "Transfer resolution failed, leaving record unenriched"
                );
                return;
            }
            Ok(Ok(None)) => {
                tracing::warn!(
                    nonce = tx.nonce(),
                    block_number = tx.block_number(),
                    "No transfer matched mined transaction"
                );
                return;
            }
            Ok(Ok(Some(transfer))) => transfer,
        };

        let outcome = self.store.merge_resolved(&tx, &transfer, self.watched);
        tracing::debug!(
            nonce = outcome.record.nonce,
            status = %outcome.record.status,
            "Merged resolved transfer"
        );

        if outcome.previous_status != Some(outcome.record.status) {
            self.notify(&outcome.record, outcome.previous_status);
        }
        self.publish();
    }

    fn notify(&self, record: &TransactionRecord, previous: Option<TransactionStatus>) {
        // No subscribers is fine; the record set remains readable on demand.
        let _ = self
            .notifications
            .send(TransactionNotification::for_transition(record, previous));
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.store.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, U64, U256, address};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use watchtower_core::resolver::{ResolvedTransfer, TransferCategory};

    const WATCHED: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const PEER: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    const OTHER: Address = address!("0xcccccccccccccccccccccccccccccccccccccccc");

    /// Scripted resolver: transfers keyed by block number, an optional
    /// failure, and an optional gate to hold lookups open mid-flight.
    #[derive(Default)]
    struct MockResolver {
        transfers: Mutex<HashMap<u64, ResolvedTransfer>>,
        failure: Option<WatcherError>,
        gate: Option<Arc<Notify>>,
    }

    impl MockResolver {
        fn with_transfer(block_number: u64, transfer: ResolvedTransfer) -> Self {
            let resolver = Self::default();
            resolver
                .transfers
                .lock()
                .unwrap()
                .insert(block_number, transfer);
            resolver
        }
    }

    impl TransferResolver for MockResolver {
        async fn resolve(
            &self,
            query: &TransferQuery,
        ) -> Result<Option<ResolvedTransfer>, WatcherError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            let transfers = self.transfers.lock().unwrap();
            Ok(transfers.get(&query.block_number).cloned())
        }
    }

    fn pending(nonce: u64) -> PendingTransaction {
        PendingTransaction {
            hash: B256::repeat_byte(nonce as u8),
            from: WATCHED,
            to: PEER,
            value: U256::from(5u64),
            nonce: U64::from(nonce),
        }
    }

    fn mined(nonce: u64, block_number: u64, from: Address, to: Address) -> MinedTransactionEvent {
        MinedTransactionEvent {
            removed: false,
            transaction: watchtower_core::events::MinedTransaction {
                block_number: U64::from(block_number),
                hash: Some(B256::repeat_byte(0xee)),
                from,
                to,
                nonce: U64::from(nonce),
            },
        }
    }

    fn eth_transfer(from: Address, to: Address) -> ResolvedTransfer {
        ResolvedTransfer {
            asset: Some("ETH".to_string()),
            value: Some(1.5),
            category: TransferCategory::External,
            from,
            to: Some(to),
            hash: Some(B256::repeat_byte(0xee)),
            block_timestamp: Some(chrono::Utc::now()),
        }
    }

    fn reconciler(resolver: MockResolver) -> EventReconciler<MockResolver> {
        EventReconciler::new(WATCHED, Network::EthMainnet, Arc::new(resolver))
    }

    #[tokio::test]
    async fn test_one_record_per_nonce() {
        let r = reconciler(MockResolver::with_transfer(100, eth_transfer(WATCHED, PEER)));

        r.on_pending(pending(1));
        r.on_pending(pending(1));
        r.on_mined(mined(1, 100, WATCHED, PEER)).await;

        assert_eq!(r.records().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_collision_cancels_and_preserves_fields() {
        let r = reconciler(MockResolver::default());

        r.on_pending(pending(1));
        r.on_pending(pending(1));

        let records = r.records();
        assert_eq!(records[0].status, TransactionStatus::Cancelled);
        assert_eq!(records[0].from_address, WATCHED);
        assert_eq!(records[0].to_address, PEER);
        assert_eq!(records[0].value, 5.0);
        assert_eq!(records[0].hash, Some(B256::repeat_byte(1)));
    }

    #[tokio::test]
    async fn test_cancelled_survives_mined_merge_but_enriches() {
        let r = reconciler(MockResolver::with_transfer(100, eth_transfer(WATCHED, PEER)));

        r.on_pending(pending(1));
        r.on_pending(pending(1));
        r.on_mined(mined(1, 100, WATCHED, PEER)).await;

        let record = &r.records()[0];
        assert_eq!(record.status, TransactionStatus::Cancelled);
        assert_eq!(record.value, 1.5);
        assert_eq!(record.asset, "ETH");
        assert!(record.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_outgoing_mined_is_sent() {
        let r = reconciler(MockResolver::with_transfer(100, eth_transfer(WATCHED, PEER)));

        r.on_pending(pending(1));
        r.on_mined(mined(1, 100, WATCHED, PEER)).await;

        assert_eq!(r.records()[0].status, TransactionStatus::Sent);
    }

    #[tokio::test]
    async fn test_sender_match_ignores_hex_casing() {
        let r = reconciler(MockResolver::with_transfer(100, eth_transfer(WATCHED, PEER)));

        r.on_pending(pending(1));

        // Same sender, delivered by the feed in uppercase hex.
        let event = MinedTransactionEvent::from_json(json!({
            "transaction": {
                "blockNumber": "0x64",
                "from": "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                "to": "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB",
                "nonce": "0x1"
            }
        }))
        .unwrap();
        r.on_mined(event).await;

        assert_eq!(r.records()[0].status, TransactionStatus::Sent);
    }

    #[tokio::test]
    async fn test_unseen_incoming_mined_is_received_with_transfer_fields() {
        let mut transfer = eth_transfer(OTHER, WATCHED);
        transfer.asset = Some("USDC".to_string());
        transfer.value = Some(10.0);
        transfer.category = TransferCategory::Erc20;
        let r = reconciler(MockResolver::with_transfer(200, transfer));

        r.on_mined(mined(2, 200, OTHER, WATCHED)).await;

        let record = &r.records()[0];
        assert_eq!(record.status, TransactionStatus::Received);
        assert_eq!(record.value, 10.0);
        assert_eq!(record.asset, "USDC");
        assert_eq!(record.category, Some(TransferCategory::Erc20));
        assert_eq!(record.from_address, OTHER);
        assert_eq!(record.to_address, WATCHED);
    }

    #[tokio::test]
    async fn test_resolver_miss_leaves_record_unchanged() {
        let r = reconciler(MockResolver::default());

        r.on_pending(pending(1));
        r.on_mined(mined(1, 100, WATCHED, PEER)).await;

        let record = &r.records()[0];
        assert_eq!(record.status, TransactionStatus::Pending);
        assert_eq!(record.asset, "WEI");
        assert!(record.timestamp.is_none());
    }

    #[tokio::test]
    async fn test_resolver_miss_for_unseen_nonce_is_noop() {
        let r = reconciler(MockResolver::default());

        r.on_mined(mined(7, 100, OTHER, WATCHED)).await;

        assert!(r.records().is_empty());
    }

    #[tokio::test]
    async fn test_resolver_failure_degrades_gracefully() {
        let resolver = MockResolver {
            failure: Some(WatcherError::InternalError {
                message: "boom".to_string(),
            }),
            ..Default::default()
        };
        let r = reconciler(resolver);

        r.on_pending(pending(1));
        r.on_mined(mined(1, 100, WATCHED, PEER)).await;

        assert_eq!(r.records()[0].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_resolver_timeout_degrades_gracefully() {
        let resolver = MockResolver {
            // Never released, so every lookup hangs until the deadline.
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        };
        let r = reconciler(resolver).with_resolve_timeout(Duration::from_millis(20));

        r.on_pending(pending(1));
        r.on_mined(mined(1, 100, WATCHED, PEER)).await;

        assert_eq!(r.records()[0].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_pending_during_suspended_mine_is_not_lost() {
        let gate = Arc::new(Notify::new());
        let resolver = MockResolver {
            transfers: Mutex::new(HashMap::from([(100, eth_transfer(WATCHED, PEER))])),
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let r = Arc::new(reconciler(resolver));

        r.on_pending(pending(1));

        let suspended = {
            let r = r.clone();
            tokio::spawn(async move { r.on_mined(mined(1, 100, WATCHED, PEER)).await })
        };
        // Give the mined handler a chance to reach the resolver gate.
        tokio::task::yield_now().await;

        // A different nonce lands while nonce 1's lookup is suspended.
        r.on_pending(pending(2));

        gate.notify_one();
        suspended.await.unwrap();

        let records = r.records();
        assert_eq!(records.len(), 2);
        // The merge landed on the live map: nonce 2 still exists and nonce 1
        // was enriched, newest touch first.
        assert_eq!(records[0].nonce, 1);
        assert_eq!(records[0].status, TransactionStatus::Sent);
        assert_eq!(records[1].nonce, 2);
        assert_eq!(records[1].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_pending_for_cancelled_nonce_is_silent() {
        let r = reconciler(MockResolver::default());
        let mut notifications = r.notifications();

        r.on_pending(pending(1));
        r.on_pending(pending(1));
        r.on_pending(pending(1));

        // Exactly two notifications: Pending, then Cancelled.
        assert_eq!(notifications.try_recv().unwrap().status, TransactionStatus::Pending);
        assert_eq!(
            notifications.try_recv().unwrap().status,
            TransactionStatus::Cancelled
        );
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_pending_json_is_rejected_without_state_change() {
        let r = reconciler(MockResolver::default());

        let result = r.on_pending_json(json!({ "hash": "0x01" }));

        assert!(matches!(result, Err(WatcherError::InvalidEvent { .. })));
        assert!(r.records().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_channel_publishes_ordered_list() {
        let r = reconciler(MockResolver::default());
        let snapshots = r.snapshots();

        r.on_pending(pending(1));
        r.on_pending(pending(2));

        let list = snapshots.borrow();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].nonce, 2);
        assert_eq!(list[1].nonce, 1);
    }

    #[tokio::test]
    async fn test_apply_dispatches_unified_events() {
        let r = reconciler(MockResolver::with_transfer(100, eth_transfer(WATCHED, PEER)));

        r.apply(Event::Pending(pending(1))).await.unwrap();
        r.apply(Event::Mined(mined(1, 100, WATCHED, PEER)))
            .await
            .unwrap();

        assert_eq!(r.records()[0].status, TransactionStatus::Sent);
    }

    #[tokio::test]
    async fn test_notification_summary_matches_status() {
        let r = reconciler(MockResolver::default());
        let mut notifications = r.notifications();

        r.on_pending(pending(1));

        let notification = notifications.try_recv().unwrap();
        assert!(notification.summary.starts_with("Pending transaction to 0x"));
        assert_eq!(notification.nonce, 1);
        assert_eq!(notification.previous_status, None);
    }
}
