use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::sync::RwLock;

use alloy::primitives::Address;
use watchtower_core::events::{MinedTransaction, PendingTransaction};
use watchtower_core::record::{TransactionRecord, TransactionStatus};
use watchtower_core::resolver::ResolvedTransfer;

/// Outcome of applying a pending event.
#[derive(Debug, Clone)]
pub enum PendingOutcome {
    /// First observation of the nonce; a Pending record was inserted.
    Inserted(TransactionRecord),
    /// The nonce was already tracked; its record was flipped to Cancelled.
    Cancelled {
        record: TransactionRecord,
        previous: TransactionStatus,
    },
    /// Re-delivery for a nonce that is already Cancelled; nothing changed.
    AlreadyCancelled,
}

/// Outcome of merging a resolved transfer into the set.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub record: TransactionRecord,
    /// Status before the merge; `None` when the record was created by it.
    pub previous_status: Option<TransactionStatus>,
}

struct Tracked {
    record: TransactionRecord,
    touched_at: u64,
}

#[derive(Default)]
struct RecordSet {
    records: HashMap<u64, Tracked>,
    touch_seq: u64,
}

/// The session's record set, keyed by nonce. Every mutation is an atomic
/// read-modify-write against the live map, so a caller that suspended on a
/// network lookup merges into whatever the map holds *now*, never into a
/// snapshot captured before the suspension.
#[derive(Default)]
pub struct RecordStore {
    inner: RwLock<RecordSet>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a pending event. A nonce collision marks the existing record
    /// Cancelled and leaves every other field untouched: the superseding
    /// payload is a replacement signal, not a trusted restatement of the
    /// original intent.
    pub fn apply_pending(&self, tx: &PendingTransaction) -> PendingOutcome {
        let mut set = self.inner.write().unwrap_or_else(|e| e.into_inner());
        set.touch_seq += 1;
        let seq = set.touch_seq;

        match set.records.entry(tx.nonce()) {
            MapEntry::Occupied(mut occupied) => {
                let tracked = occupied.get_mut();
                if tracked.record.status == TransactionStatus::Cancelled {
                    return PendingOutcome::AlreadyCancelled;
                }
                let previous = tracked.record.status;
                tracked.record.status = TransactionStatus::Cancelled;
                tracked.touched_at = seq;
                PendingOutcome::Cancelled {
                    record: tracked.record.clone(),
                    previous,
                }
            }
            MapEntry::Vacant(vacant) => {
                let tracked = vacant.insert(Tracked {
                    record: TransactionRecord::from_pending(tx),
                    touched_at: seq,
                });
                PendingOutcome::Inserted(tracked.record.clone())
            }
        }
    }

    /// Merge a resolved transfer for a mined transaction, creating the
    /// record first if the nonce was never observed pending. Status follows
    /// [`TransactionStatus::on_mined`]; Cancelled is never reverted.
    pub fn merge_resolved(
        &self,
        mined: &MinedTransaction,
        transfer: &ResolvedTransfer,
        watched: Address,
    ) -> MergeOutcome {
        let mut set = self.inner.write().unwrap_or_else(|e| e.into_inner());
        set.touch_seq += 1;
        let seq = set.touch_seq;

        let nonce = mined.nonce();
        let previous_status = set.records.get(&nonce).map(|t| t.record.status);
        let status = TransactionStatus::on_mined(previous_status, mined.from == watched);

        let tracked = set.records.entry(nonce).or_insert_with(|| Tracked {
            record: TransactionRecord::from_transfer(nonce, status, transfer, watched),
            touched_at: seq,
        });
        tracked.record.status = status;
        tracked.record.merge_transfer(transfer);
        tracked.touched_at = seq;

        MergeOutcome {
            record: tracked.record.clone(),
            previous_status,
        }
    }

    pub fn get(&self, nonce: u64) -> Option<TransactionRecord> {
        let set = self.inner.read().unwrap_or_else(|e| e.into_inner());
        set.records.get(&nonce).map(|t| t.record.clone())
    }

    /// Full record list ordered by descending touch recency (newest first).
    /// Recomputed per call; the set is session-scoped and small.
    pub fn snapshot(&self) -> Vec<TransactionRecord> {
        let set = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<_> = set
            .records
            .values()
            .map(|t| (t.touched_at, t.record.clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, record)| record).collect()
    }

    pub fn len(&self) -> usize {
        let set = self.inner.read().unwrap_or_else(|e| e.into_inner());
        set.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, U64, U256, address};
    use watchtower_core::resolver::TransferCategory;

    const WATCHED: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const PEER: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    fn pending(nonce: u64) -> PendingTransaction {
        PendingTransaction {
            hash: B256::repeat_byte(nonce as u8),
            from: WATCHED,
            to: PEER,
            value: U256::from(5u64),
            nonce: U64::from(nonce),
        }
    }

    fn mined(nonce: u64, from: Address, to: Address) -> MinedTransaction {
        MinedTransaction {
            block_number: U64::from(100u64),
            hash: Some(B256::repeat_byte(0xee)),
            from,
            to,
            nonce: U64::from(nonce),
        }
    }

    fn transfer() -> ResolvedTransfer {
        ResolvedTransfer {
            asset: Some("ETH".to_string()),
            value: Some(1.5),
            category: TransferCategory::External,
            from: WATCHED,
            to: Some(PEER),
            hash: Some(B256::repeat_byte(0xee)),
            block_timestamp: None,
        }
    }

    #[test]
    fn test_pending_collision_cancels_without_field_churn() {
        let store = RecordStore::new();
        store.apply_pending(&pending(1));

        let outcome = store.apply_pending(&pending(1));
        match outcome {
            PendingOutcome::Cancelled { record, previous } => {
                assert_eq!(previous, TransactionStatus::Pending);
                assert_eq!(record.status, TransactionStatus::Cancelled);
                assert_eq!(record.to_address, PEER);
                assert_eq!(record.value, 5.0);
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }

        assert!(matches!(
            store.apply_pending(&pending(1)),
            PendingOutcome::AlreadyCancelled
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_creates_record_for_unseen_nonce() {
        let store = RecordStore::new();
        assert!(store.is_empty());

        let outcome = store.merge_resolved(&mined(9, PEER, WATCHED), &transfer(), WATCHED);

        assert_eq!(outcome.previous_status, None);
        assert_eq!(outcome.record.status, TransactionStatus::Received);
        assert_eq!(outcome.record.value, 1.5);
        assert_eq!(outcome.record.asset, "ETH");
        assert_eq!(
            store.get(9).map(|r| r.status),
            Some(TransactionStatus::Received)
        );
    }

    #[test]
    fn test_snapshot_newest_touched_first() {
        let store = RecordStore::new();
        store.apply_pending(&pending(1));
        store.apply_pending(&pending(2));
        store.apply_pending(&pending(3));

        // Touch nonce 1 again via a collision; it should move to the front.
        store.apply_pending(&pending(1));

        let nonces: Vec<u64> = store.snapshot().iter().map(|r| r.nonce).collect();
        assert_eq!(nonces, vec![1, 3, 2]);
    }
}
