//! Starling Core - shared types for partition-state synchronization.
//!
//! This crate defines the vocabulary the rest of Starling speaks:
//! strongly-typed identifiers and fencing epochs, the leader-and-ISR
//! state model, controller status codes, and the wire shapes exchanged
//! with the controller.
//!
//! # Design
//!
//! - Every identifier is a distinct wrapper type; a `BrokerId` can never
//!   be passed where a `LeaderEpoch` is expected.
//! - Wire decoding is total: truncated input yields `None`, unknown
//!   status codes degrade to `UnknownServerError`, and the raw
//!   leader-recovery marker is validated by the consumer so one bad
//!   partition cannot poison a batch.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod codes;
mod state;
mod types;
mod wire;

pub use codes::ErrorCode;
pub use state::{CommittedIsr, IsrMember, LeaderRecoveryState, ProposedIsr, TopicPartition};
pub use types::{BrokerEpoch, BrokerId, LeaderEpoch, PartitionEpoch, PartitionIndex, TopicId};
pub use wire::{
    PartitionState, PartitionStateResponse, SyncRequest, SyncResponse, TopicState,
    TopicStateResponse,
};
