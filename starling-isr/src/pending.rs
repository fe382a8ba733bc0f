//! De-duplicated store of not-yet-resolved partition updates.
//!
//! One slot per partition. An entry lives from the moment a submission
//! is accepted until a controller response definitively accounts for the
//! partition; it survives any number of send attempts in between.
//!
//! Uses `DashMap` for lock-free concurrent access: the per-partition
//! submit path stays cheap under high partition counts, and a snapshot
//! for one send cycle never blocks inserts for other partitions.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use starling_core::{CommittedIsr, ProposedIsr, TopicPartition};
use tokio::sync::oneshot;

use crate::error::SyncResult;

/// An accepted update waiting for a controller verdict.
#[derive(Debug)]
pub struct PendingUpdate {
    /// The proposed leader-and-ISR state.
    pub proposed: ProposedIsr,
    /// Single-assignment completion handle, resolved exactly once.
    pub completion: oneshot::Sender<SyncResult<CommittedIsr>>,
}

impl PendingUpdate {
    /// Creates a pending update.
    #[must_use]
    pub const fn new(
        proposed: ProposedIsr,
        completion: oneshot::Sender<SyncResult<CommittedIsr>>,
    ) -> Self {
        Self {
            proposed,
            completion,
        }
    }
}

/// Concurrent map of pending updates, at most one per partition.
///
/// Invariant: a key is present iff an update has been accepted but not
/// yet resolved by a response. All operations are safe from arbitrary
/// threads without external locking.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    entries: DashMap<TopicPartition, PendingUpdate>,
}

impl PendingUpdates {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Atomically inserts `update` if no entry exists for `key`.
    ///
    /// # Errors
    /// Returns the rejected update when the slot is occupied; the
    /// existing entry is never overwritten.
    pub fn try_insert(
        &self,
        key: TopicPartition,
        update: PendingUpdate,
    ) -> Result<(), PendingUpdate> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(update),
            Entry::Vacant(slot) => {
                slot.insert(update);
                Ok(())
            }
        }
    }

    /// Removes and returns the entry for `key`, if present.
    pub fn remove(&self, key: &TopicPartition) -> Option<PendingUpdate> {
        self.entries.remove(key).map(|(_, update)| update)
    }

    /// Returns a point-in-time copy of all current proposals, sorted by
    /// partition key.
    ///
    /// Entries added concurrently for other keys may or may not be
    /// captured; later additions simply ride the next cycle.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(TopicPartition, ProposedIsr)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().proposed.clone()))
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    /// Returns true if an update for `key` is pending.
    #[must_use]
    pub fn contains(&self, key: &TopicPartition) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of pending updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no updates are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_core::{
        BrokerEpoch, BrokerId, IsrMember, LeaderEpoch, LeaderRecoveryState, PartitionEpoch,
        PartitionIndex, TopicId,
    };

    fn key(topic: u64, partition: u64) -> TopicPartition {
        TopicPartition::new(TopicId::new(topic), PartitionIndex::new(partition))
    }

    fn proposal(leader_epoch: u64) -> ProposedIsr {
        ProposedIsr {
            leader_epoch: LeaderEpoch::new(leader_epoch),
            isr: vec![IsrMember::new(BrokerId::new(1), BrokerEpoch::new(1))],
            leader_recovery: LeaderRecoveryState::Recovered,
            partition_epoch: PartitionEpoch::new(1),
        }
    }

    fn update(leader_epoch: u64) -> (PendingUpdate, oneshot::Receiver<SyncResult<CommittedIsr>>) {
        let (tx, rx) = oneshot::channel();
        (PendingUpdate::new(proposal(leader_epoch), tx), rx)
    }

    #[test]
    fn test_insert_and_remove() {
        let store = PendingUpdates::new();
        let (first, _rx) = update(5);

        assert!(store.try_insert(key(1, 0), first).is_ok());
        assert!(store.contains(&key(1, 0)));
        assert_eq!(store.len(), 1);

        let removed = store.remove(&key(1, 0)).unwrap();
        assert_eq!(removed.proposed.leader_epoch, LeaderEpoch::new(5));
        assert!(store.is_empty());
        assert!(store.remove(&key(1, 0)).is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected_without_overwrite() {
        let store = PendingUpdates::new();
        let (first, _rx1) = update(5);
        let (second, _rx2) = update(6);

        assert!(store.try_insert(key(1, 0), first).is_ok());

        let rejected = store.try_insert(key(1, 0), second).unwrap_err();
        assert_eq!(rejected.proposed.leader_epoch, LeaderEpoch::new(6));

        // The original entry is untouched.
        let kept = store.remove(&key(1, 0)).unwrap();
        assert_eq!(kept.proposed.leader_epoch, LeaderEpoch::new(5));
    }

    #[test]
    fn test_snapshot_is_sorted_and_nondestructive() {
        let store = PendingUpdates::new();
        let (a, _rxa) = update(1);
        let (b, _rxb) = update(2);
        let (c, _rxc) = update(3);

        store.try_insert(key(2, 0), a).unwrap();
        store.try_insert(key(1, 1), b).unwrap();
        store.try_insert(key(1, 0), c).unwrap();

        let snapshot = store.snapshot();
        let keys: Vec<_> = snapshot.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![key(1, 0), key(1, 1), key(2, 0)]);

        // Snapshot does not drain the store.
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_concurrent_inserts_one_winner_per_key() {
        use std::sync::Arc;

        let store = Arc::new(PendingUpdates::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let mut accepted = 0usize;
                for partition in 0..32u64 {
                    let (tx, _rx) = oneshot::channel();
                    let candidate = PendingUpdate::new(proposal(1), tx);
                    if store.try_insert(key(1, partition), candidate).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            }));
        }

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 32);
        assert_eq!(store.len(), 32);
    }
}
