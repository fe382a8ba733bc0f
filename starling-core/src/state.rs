//! Partition leadership and replication state.
//!
//! These types carry a partition's leader-and-ISR state between a broker
//! and the controller. A broker proposes a new state (`ProposedIsr`); the
//! controller either commits it and answers with the authoritative state
//! (`CommittedIsr`) or rejects it with an error code.

use std::fmt;

use crate::types::{BrokerEpoch, BrokerId, LeaderEpoch, PartitionEpoch, PartitionIndex, TopicId};

/// Identifies a single partition: topic identity plus partition index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicPartition {
    /// The owning topic.
    pub topic: TopicId,
    /// The partition index within the topic.
    pub partition: PartitionIndex,
}

impl TopicPartition {
    /// Creates a new topic-partition key.
    #[must_use]
    pub const fn new(topic: TopicId, partition: PartitionIndex) -> Self {
        Self { topic, partition }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic-{}-{}", self.topic.get(), self.partition.get())
    }
}

impl fmt::Debug for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicPartition({}, {})", self.topic.get(), self.partition.get())
    }
}

/// Whether a partition's leader was elected through an unclean
/// (potentially data-losing) recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderRecoveryState {
    /// The leader completed recovery; the partition is fully available.
    Recovered,
    /// The leader is still recovering after an unclean election.
    Recovering,
}

impl LeaderRecoveryState {
    /// Returns the wire code for this state.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::Recovered => 0,
            Self::Recovering => 1,
        }
    }

    /// Decodes a wire code, returning `None` for unrecognized values.
    ///
    /// Callers must treat `None` as a decoding failure for the affected
    /// partition, never as a default.
    #[must_use]
    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::Recovered),
            1 => Some(Self::Recovering),
            _ => None,
        }
    }
}

/// An in-sync replica tagged with its broker's process epoch.
///
/// The broker epoch lets the controller fence ISR entries that refer to
/// a previous incarnation of a restarted broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsrMember {
    /// The replica's broker id.
    pub broker_id: BrokerId,
    /// The epoch of the broker process hosting the replica.
    pub broker_epoch: BrokerEpoch,
}

impl IsrMember {
    /// Creates a new ISR member.
    #[must_use]
    pub const fn new(broker_id: BrokerId, broker_epoch: BrokerEpoch) -> Self {
        Self {
            broker_id,
            broker_epoch,
        }
    }
}

/// A proposed leader-and-ISR state, as submitted by a partition leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedIsr {
    /// The proposing leader's epoch.
    pub leader_epoch: LeaderEpoch,
    /// The proposed in-sync replica set, each tagged with its broker epoch.
    pub isr: Vec<IsrMember>,
    /// Recovery state of the current leader.
    pub leader_recovery: LeaderRecoveryState,
    /// Partition epoch the proposal is based on (fencing token).
    pub partition_epoch: PartitionEpoch,
}

/// The controller's authoritative leader-and-ISR state for a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedIsr {
    /// The partition leader.
    pub leader: BrokerId,
    /// The committed leader epoch.
    pub leader_epoch: LeaderEpoch,
    /// The committed in-sync replica set.
    pub isr: Vec<BrokerId>,
    /// Recovery state of the leader.
    pub leader_recovery: LeaderRecoveryState,
    /// The new partition epoch assigned by the controller.
    pub partition_epoch: PartitionEpoch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_partition_display() {
        let tp = TopicPartition::new(TopicId::new(7), PartitionIndex::new(2));
        assert_eq!(format!("{tp}"), "topic-7-2");
    }

    #[test]
    fn test_topic_partition_ordering() {
        let a = TopicPartition::new(TopicId::new(1), PartitionIndex::new(5));
        let b = TopicPartition::new(TopicId::new(2), PartitionIndex::new(0));
        let c = TopicPartition::new(TopicId::new(1), PartitionIndex::new(6));

        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn test_leader_recovery_codes() {
        assert_eq!(LeaderRecoveryState::Recovered.code(), 0);
        assert_eq!(LeaderRecoveryState::Recovering.code(), 1);
        assert_eq!(LeaderRecoveryState::from_code(0), Some(LeaderRecoveryState::Recovered));
        assert_eq!(LeaderRecoveryState::from_code(1), Some(LeaderRecoveryState::Recovering));
        assert_eq!(LeaderRecoveryState::from_code(2), None);
        assert_eq!(LeaderRecoveryState::from_code(-1), None);
    }
}
