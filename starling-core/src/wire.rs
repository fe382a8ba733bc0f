//! Wire shapes for controller synchronization.
//!
//! One batched request carries every pending partition-state proposal a
//! broker has accumulated; the response carries a top-level status code
//! and a per-partition outcome. The codec is a compact length-counted
//! binary layout; all integers are little-endian.
//!
//! `decode` returns `None` on truncated or malformed input. Response
//! fields that need semantic validation (the leader-recovery marker) are
//! left raw here so the caller can fail a single partition rather than
//! the whole response.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codes::ErrorCode;
use crate::state::{IsrMember, LeaderRecoveryState};
use crate::types::{BrokerEpoch, BrokerId, LeaderEpoch, PartitionEpoch, PartitionIndex, TopicId};

/// A batched partition-state synchronization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// The sending broker.
    pub broker_id: BrokerId,
    /// The sending broker's current epoch, read fresh at send time.
    pub broker_epoch: BrokerEpoch,
    /// Proposed states, grouped by topic.
    pub topics: Vec<TopicState>,
}

/// Proposed states for the partitions of one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicState {
    /// The topic identity.
    pub topic_id: TopicId,
    /// One entry per partition with a pending proposal.
    pub partitions: Vec<PartitionState>,
}

/// A proposed state for a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionState {
    /// The partition index.
    pub partition: PartitionIndex,
    /// The proposing leader's epoch.
    pub leader_epoch: LeaderEpoch,
    /// The proposed in-sync replica set with broker epochs.
    pub new_isr: Vec<IsrMember>,
    /// The partition epoch the proposal is based on.
    pub partition_epoch: PartitionEpoch,
    /// Recovery state of the proposing leader.
    pub leader_recovery: LeaderRecoveryState,
}

/// Response to a [`SyncRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResponse {
    /// Top-level status. Anything but `None` means no partition in the
    /// request was processed.
    pub error: ErrorCode,
    /// Per-topic outcomes, present only on top-level success.
    pub topics: Vec<TopicStateResponse>,
}

/// Outcomes for the partitions of one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStateResponse {
    /// The topic identity.
    pub topic_id: TopicId,
    /// One outcome per processed partition.
    pub partitions: Vec<PartitionStateResponse>,
}

/// The controller's outcome for a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionStateResponse {
    /// The partition index.
    pub partition: PartitionIndex,
    /// Per-partition status code.
    pub error: ErrorCode,
    /// The committed leader (valid on success).
    pub leader: BrokerId,
    /// The committed leader epoch (valid on success).
    pub leader_epoch: LeaderEpoch,
    /// The committed in-sync replica set (valid on success).
    pub isr: Vec<BrokerId>,
    /// Raw leader-recovery marker. Kept unvalidated so one malformed
    /// partition cannot corrupt the others; see
    /// [`LeaderRecoveryState::from_code`].
    pub leader_recovery: i8,
    /// The new partition epoch (valid on success).
    pub partition_epoch: PartitionEpoch,
}

impl SyncRequest {
    /// Encodes the request to bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u64_le(self.broker_id.get());
        buf.put_u64_le(self.broker_epoch.get());
        // Safe cast: topic counts are bounded by the pending-store size,
        // which fits in u32.
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u32_le(self.topics.len() as u32);
        for topic in &self.topics {
            buf.put_u64_le(topic.topic_id.get());
            #[allow(clippy::cast_possible_truncation)]
            buf.put_u32_le(topic.partitions.len() as u32);
            for partition in &topic.partitions {
                buf.put_u64_le(partition.partition.get());
                buf.put_u64_le(partition.leader_epoch.get());
                #[allow(clippy::cast_possible_truncation)]
                buf.put_u32_le(partition.new_isr.len() as u32);
                for member in &partition.new_isr {
                    buf.put_u64_le(member.broker_id.get());
                    buf.put_u64_le(member.broker_epoch.get());
                }
                buf.put_u64_le(partition.partition_epoch.get());
                buf.put_i8(partition.leader_recovery.code());
            }
        }
        buf.freeze()
    }

    /// Decodes a request from bytes.
    #[must_use]
    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < 8 + 8 + 4 {
            return None;
        }
        let broker_id = BrokerId::new(buf.get_u64_le());
        let broker_epoch = BrokerEpoch::new(buf.get_u64_le());
        let topic_count = buf.get_u32_le() as usize;

        let mut topics = Vec::new();
        for _ in 0..topic_count {
            if buf.remaining() < 8 + 4 {
                return None;
            }
            let topic_id = TopicId::new(buf.get_u64_le());
            let partition_count = buf.get_u32_le() as usize;

            let mut partitions = Vec::new();
            for _ in 0..partition_count {
                if buf.remaining() < 8 + 8 + 4 {
                    return None;
                }
                let partition = PartitionIndex::new(buf.get_u64_le());
                let leader_epoch = LeaderEpoch::new(buf.get_u64_le());
                let isr_count = buf.get_u32_le() as usize;
                if buf.remaining() < isr_count * 16 + 8 + 1 {
                    return None;
                }
                let mut new_isr = Vec::with_capacity(isr_count);
                for _ in 0..isr_count {
                    let broker_id = BrokerId::new(buf.get_u64_le());
                    let broker_epoch = BrokerEpoch::new(buf.get_u64_le());
                    new_isr.push(IsrMember::new(broker_id, broker_epoch));
                }
                let partition_epoch = PartitionEpoch::new(buf.get_u64_le());
                let leader_recovery = LeaderRecoveryState::from_code(buf.get_i8())?;
                partitions.push(PartitionState {
                    partition,
                    leader_epoch,
                    new_isr,
                    partition_epoch,
                    leader_recovery,
                });
            }
            topics.push(TopicState {
                topic_id,
                partitions,
            });
        }

        Some(Self {
            broker_id,
            broker_epoch,
            topics,
        })
    }

    /// Returns the total number of partitions in the request.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.topics.iter().map(|t| t.partitions.len()).sum()
    }
}

impl SyncResponse {
    /// Encodes the response to bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_i16_le(self.error.code());
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u32_le(self.topics.len() as u32);
        for topic in &self.topics {
            buf.put_u64_le(topic.topic_id.get());
            #[allow(clippy::cast_possible_truncation)]
            buf.put_u32_le(topic.partitions.len() as u32);
            for partition in &topic.partitions {
                buf.put_u64_le(partition.partition.get());
                buf.put_i16_le(partition.error.code());
                buf.put_u64_le(partition.leader.get());
                buf.put_u64_le(partition.leader_epoch.get());
                #[allow(clippy::cast_possible_truncation)]
                buf.put_u32_le(partition.isr.len() as u32);
                for broker in &partition.isr {
                    buf.put_u64_le(broker.get());
                }
                buf.put_i8(partition.leader_recovery);
                buf.put_u64_le(partition.partition_epoch.get());
            }
        }
        buf.freeze()
    }

    /// Decodes a response from bytes.
    #[must_use]
    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < 2 + 4 {
            return None;
        }
        let error = ErrorCode::from_code(buf.get_i16_le());
        let topic_count = buf.get_u32_le() as usize;

        let mut topics = Vec::new();
        for _ in 0..topic_count {
            if buf.remaining() < 8 + 4 {
                return None;
            }
            let topic_id = TopicId::new(buf.get_u64_le());
            let partition_count = buf.get_u32_le() as usize;

            let mut partitions = Vec::new();
            for _ in 0..partition_count {
                if buf.remaining() < 8 + 2 + 8 + 8 + 4 {
                    return None;
                }
                let partition = PartitionIndex::new(buf.get_u64_le());
                let error = ErrorCode::from_code(buf.get_i16_le());
                let leader = BrokerId::new(buf.get_u64_le());
                let leader_epoch = LeaderEpoch::new(buf.get_u64_le());
                let isr_count = buf.get_u32_le() as usize;
                if buf.remaining() < isr_count * 8 + 1 + 8 {
                    return None;
                }
                let mut isr = Vec::with_capacity(isr_count);
                for _ in 0..isr_count {
                    isr.push(BrokerId::new(buf.get_u64_le()));
                }
                let leader_recovery = buf.get_i8();
                let partition_epoch = PartitionEpoch::new(buf.get_u64_le());
                partitions.push(PartitionStateResponse {
                    partition,
                    error,
                    leader,
                    leader_epoch,
                    isr,
                    leader_recovery,
                    partition_epoch,
                });
            }
            topics.push(TopicStateResponse {
                topic_id,
                partitions,
            });
        }

        Some(Self { error, topics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> SyncRequest {
        SyncRequest {
            broker_id: BrokerId::new(1),
            broker_epoch: BrokerEpoch::new(12),
            topics: vec![TopicState {
                topic_id: TopicId::new(5),
                partitions: vec![PartitionState {
                    partition: PartitionIndex::new(0),
                    leader_epoch: LeaderEpoch::new(3),
                    new_isr: vec![
                        IsrMember::new(BrokerId::new(1), BrokerEpoch::new(12)),
                        IsrMember::new(BrokerId::new(2), BrokerEpoch::new(8)),
                    ],
                    partition_epoch: PartitionEpoch::new(7),
                    leader_recovery: LeaderRecoveryState::Recovered,
                }],
            }],
        }
    }

    #[test]
    fn test_request_encode_decode() {
        let request = sample_request();
        let encoded = request.encode();
        let decoded = SyncRequest::decode(&mut encoded.clone()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.partition_count(), 1);
    }

    #[test]
    fn test_response_encode_decode() {
        let response = SyncResponse {
            error: ErrorCode::None,
            topics: vec![TopicStateResponse {
                topic_id: TopicId::new(5),
                partitions: vec![PartitionStateResponse {
                    partition: PartitionIndex::new(0),
                    error: ErrorCode::None,
                    leader: BrokerId::new(1),
                    leader_epoch: LeaderEpoch::new(3),
                    isr: vec![BrokerId::new(1), BrokerId::new(2), BrokerId::new(3)],
                    leader_recovery: 0,
                    partition_epoch: PartitionEpoch::new(8),
                }],
            }],
        };
        let encoded = response.encode();
        let decoded = SyncResponse::decode(&mut encoded.clone()).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_truncated_request_fails() {
        let encoded = sample_request().encode();
        for len in 0..encoded.len() {
            let mut truncated = encoded.slice(0..len);
            assert!(
                SyncRequest::decode(&mut truncated).is_none(),
                "decode succeeded on {len} byte prefix"
            );
        }
    }

    #[test]
    fn test_response_preserves_unrecognized_recovery_marker() {
        // The codec must not reject an unknown marker; the classifier
        // fails just that partition.
        let response = SyncResponse {
            error: ErrorCode::None,
            topics: vec![TopicStateResponse {
                topic_id: TopicId::new(1),
                partitions: vec![PartitionStateResponse {
                    partition: PartitionIndex::new(0),
                    error: ErrorCode::None,
                    leader: BrokerId::new(1),
                    leader_epoch: LeaderEpoch::new(1),
                    isr: vec![BrokerId::new(1)],
                    leader_recovery: 9,
                    partition_epoch: PartitionEpoch::new(1),
                }],
            }],
        };
        let encoded = response.encode();
        let decoded = SyncResponse::decode(&mut encoded.clone()).unwrap();
        assert_eq!(decoded.topics[0].partitions[0].leader_recovery, 9);
    }
}
