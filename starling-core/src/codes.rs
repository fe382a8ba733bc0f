//! Controller error codes.
//!
//! Numeric status codes carried in synchronization responses, both at
//! the top level and per partition. Codes are stable wire values; new
//! codes from a newer controller decode to [`ErrorCode::UnknownServerError`]
//! rather than failing the whole response.

use std::fmt;

/// Status code reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error.
    None,
    /// The server experienced an unexpected error, or sent a code this
    /// broker does not recognize.
    UnknownServerError,
    /// The receiving node is not the active controller.
    NotController,
    /// The request was malformed.
    InvalidRequest,
    /// The broker epoch in the request is stale.
    StaleBrokerEpoch,
    /// The broker is not authorized for cluster-level actions.
    ClusterAuthorizationFailed,
    /// The leader epoch in the request is stale.
    FencedLeaderEpoch,
    /// The partition epoch in the request does not match the controller's.
    InvalidUpdateVersion,
    /// The topic or partition does not exist on the controller.
    UnknownTopicOrPartition,
    /// The update was not attempted (e.g. superseded before processing).
    OperationNotAttempted,
    /// A proposed ISR member is not eligible to join the ISR.
    IneligibleReplica,
    /// A new leader was elected for the partition while the request was
    /// in flight.
    NewLeaderElected,
}

impl ErrorCode {
    /// Returns the wire value for this code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::None => 0,
            Self::UnknownServerError => -1,
            Self::NotController => 41,
            Self::InvalidRequest => 42,
            Self::StaleBrokerEpoch => 77,
            Self::ClusterAuthorizationFailed => 31,
            Self::FencedLeaderEpoch => 74,
            Self::InvalidUpdateVersion => 95,
            Self::UnknownTopicOrPartition => 3,
            Self::OperationNotAttempted => 55,
            Self::IneligibleReplica => 107,
            Self::NewLeaderElected => 108,
        }
    }

    /// Decodes a wire value.
    ///
    /// Unmapped values decode to [`Self::UnknownServerError`] so a newer
    /// controller cannot break classification on this broker.
    #[must_use]
    pub const fn from_code(code: i16) -> Self {
        match code {
            0 => Self::None,
            41 => Self::NotController,
            42 => Self::InvalidRequest,
            77 => Self::StaleBrokerEpoch,
            31 => Self::ClusterAuthorizationFailed,
            74 => Self::FencedLeaderEpoch,
            95 => Self::InvalidUpdateVersion,
            3 => Self::UnknownTopicOrPartition,
            55 => Self::OperationNotAttempted,
            107 => Self::IneligibleReplica,
            108 => Self::NewLeaderElected,
            _ => Self::UnknownServerError,
        }
    }

    /// Returns true if this code signals success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::UnknownServerError => "UNKNOWN_SERVER_ERROR",
            Self::NotController => "NOT_CONTROLLER",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::StaleBrokerEpoch => "STALE_BROKER_EPOCH",
            Self::ClusterAuthorizationFailed => "CLUSTER_AUTHORIZATION_FAILED",
            Self::FencedLeaderEpoch => "FENCED_LEADER_EPOCH",
            Self::InvalidUpdateVersion => "INVALID_UPDATE_VERSION",
            Self::UnknownTopicOrPartition => "UNKNOWN_TOPIC_OR_PARTITION",
            Self::OperationNotAttempted => "OPERATION_NOT_ATTEMPTED",
            Self::IneligibleReplica => "INELIGIBLE_REPLICA",
            Self::NewLeaderElected => "NEW_LEADER_ELECTED",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        let codes = [
            ErrorCode::None,
            ErrorCode::NotController,
            ErrorCode::StaleBrokerEpoch,
            ErrorCode::ClusterAuthorizationFailed,
            ErrorCode::FencedLeaderEpoch,
            ErrorCode::InvalidUpdateVersion,
            ErrorCode::UnknownTopicOrPartition,
            ErrorCode::OperationNotAttempted,
            ErrorCode::IneligibleReplica,
            ErrorCode::NewLeaderElected,
        ];
        for code in codes {
            assert_eq!(ErrorCode::from_code(code.code()), code);
        }
    }

    #[test]
    fn test_unmapped_code_degrades() {
        assert_eq!(ErrorCode::from_code(9999), ErrorCode::UnknownServerError);
        assert_eq!(ErrorCode::from_code(-1), ErrorCode::UnknownServerError);
    }

    #[test]
    fn test_is_ok() {
        assert!(ErrorCode::None.is_ok());
        assert!(!ErrorCode::StaleBrokerEpoch.is_ok());
    }
}
