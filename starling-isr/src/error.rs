//! Synchronization error types.

use starling_core::{ErrorCode, TopicPartition};

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced to a caller's completion handle.
///
/// Top-level retryable conditions (stale broker epoch, authentication
/// failures, and the like) never appear here: the manager retries them
/// internally and no caller is notified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// A submission was rejected because an update for the same
    /// partition is already pending. The caller must wait for the prior
    /// update to resolve and resubmit with fresh state.
    #[error("update for {partition} not attempted: a prior update is still pending")]
    AlreadyPending {
        /// The partition with the outstanding update.
        partition: TopicPartition,
    },

    /// The controller rejected the update for this partition.
    #[error("controller rejected update for {partition}: {code}")]
    Controller {
        /// The affected partition.
        partition: TopicPartition,
        /// The controller's error code.
        code: ErrorCode,
    },

    /// The controller's response carried an unrecognized leader-recovery
    /// marker for this partition. Treated as an internal error for the
    /// one partition; the rest of the batch is unaffected.
    #[error("invalid leader recovery marker {code} in response for {partition}")]
    InvalidLeaderRecovery {
        /// The affected partition.
        partition: TopicPartition,
        /// The raw marker value.
        code: i8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_core::{PartitionIndex, TopicId};

    #[test]
    fn test_error_display() {
        let partition = TopicPartition::new(TopicId::new(3), PartitionIndex::new(1));

        let err = SyncError::AlreadyPending { partition };
        assert!(format!("{err}").contains("topic-3-1"));

        let err = SyncError::Controller {
            partition,
            code: ErrorCode::InvalidUpdateVersion,
        };
        let msg = format!("{err}");
        assert!(msg.contains("topic-3-1"));
        assert!(msg.contains("INVALID_UPDATE_VERSION"));
    }
}
