//! Request assembly.
//!
//! Turns one pending-store snapshot into one batched wire request,
//! grouping partitions under their owning topic.

use std::collections::BTreeMap;

use starling_core::{
    BrokerEpoch, BrokerId, PartitionState, ProposedIsr, SyncRequest, TopicId, TopicPartition,
    TopicState,
};

/// Builds a batched request from a snapshot of pending proposals.
///
/// `broker_epoch` must be read fresh at send time, never cached across
/// cycles: the epoch can change between sends and a stale value gets
/// the whole batch rejected with `STALE_BROKER_EPOCH`.
#[must_use]
pub fn assemble_request(
    broker_id: BrokerId,
    broker_epoch: BrokerEpoch,
    snapshot: &[(TopicPartition, ProposedIsr)],
) -> SyncRequest {
    let mut by_topic: BTreeMap<TopicId, Vec<PartitionState>> = BTreeMap::new();

    for (key, proposed) in snapshot {
        by_topic.entry(key.topic).or_default().push(PartitionState {
            partition: key.partition,
            leader_epoch: proposed.leader_epoch,
            new_isr: proposed.isr.clone(),
            partition_epoch: proposed.partition_epoch,
            leader_recovery: proposed.leader_recovery,
        });
    }

    SyncRequest {
        broker_id,
        broker_epoch,
        topics: by_topic
            .into_iter()
            .map(|(topic_id, partitions)| TopicState {
                topic_id,
                partitions,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_core::{
        IsrMember, LeaderEpoch, LeaderRecoveryState, PartitionEpoch, PartitionIndex,
    };

    fn entry(topic: u64, partition: u64, leader_epoch: u64) -> (TopicPartition, ProposedIsr) {
        (
            TopicPartition::new(TopicId::new(topic), PartitionIndex::new(partition)),
            ProposedIsr {
                leader_epoch: LeaderEpoch::new(leader_epoch),
                isr: vec![IsrMember::new(BrokerId::new(1), BrokerEpoch::new(9))],
                leader_recovery: LeaderRecoveryState::Recovered,
                partition_epoch: PartitionEpoch::new(2),
            },
        )
    }

    #[test]
    fn test_groups_partitions_by_topic() {
        let snapshot = vec![entry(1, 0, 5), entry(2, 3, 7), entry(1, 1, 6)];
        let request = assemble_request(BrokerId::new(4), BrokerEpoch::new(11), &snapshot);

        assert_eq!(request.broker_id, BrokerId::new(4));
        assert_eq!(request.broker_epoch, BrokerEpoch::new(11));
        assert_eq!(request.topics.len(), 2);
        assert_eq!(request.partition_count(), 3);

        let topic_one = &request.topics[0];
        assert_eq!(topic_one.topic_id, TopicId::new(1));
        assert_eq!(topic_one.partitions.len(), 2);
        assert!(topic_one
            .partitions
            .iter()
            .all(|p| p.partition == PartitionIndex::new(0) || p.partition == PartitionIndex::new(1)));

        let topic_two = &request.topics[1];
        assert_eq!(topic_two.topic_id, TopicId::new(2));
        assert_eq!(topic_two.partitions.len(), 1);
        assert_eq!(topic_two.partitions[0].partition, PartitionIndex::new(3));
        assert_eq!(topic_two.partitions[0].leader_epoch, LeaderEpoch::new(7));
    }

    #[test]
    fn test_carries_proposal_fields_through() {
        let snapshot = vec![entry(9, 2, 42)];
        let request = assemble_request(BrokerId::new(1), BrokerEpoch::new(3), &snapshot);

        let partition = &request.topics[0].partitions[0];
        assert_eq!(partition.leader_epoch, LeaderEpoch::new(42));
        assert_eq!(partition.partition_epoch, PartitionEpoch::new(2));
        assert_eq!(partition.leader_recovery, LeaderRecoveryState::Recovered);
        assert_eq!(partition.new_isr.len(), 1);
        assert_eq!(partition.new_isr[0].broker_epoch, BrokerEpoch::new(9));
    }

    #[test]
    fn test_empty_snapshot_yields_empty_request() {
        let request = assemble_request(BrokerId::new(1), BrokerEpoch::new(1), &[]);
        assert!(request.topics.is_empty());
        assert_eq!(request.partition_count(), 0);
    }
}
