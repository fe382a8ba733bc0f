//! Starling ISR - partition-state synchronization with the controller.
//!
//! A broker-side manager that propagates proposed leader-and-ISR changes
//! to the cluster controller: batched, de-duplicated, retried, with a
//! per-partition completion handle back to the caller.
//!
//! # Guarantees
//!
//! - At most one pending update per partition; a duplicate submission
//!   fails synchronously without touching the original.
//! - At most one batched request in flight process-wide; concurrent
//!   submissions coalesce into the next cycle.
//! - No accepted update is ever silently dropped: it resolves via a
//!   controller verdict or stays pending and queryable.
//! - Transient top-level failures retry internally after a fixed
//!   backoff; callers only ever see definitive per-partition outcomes.
//!
//! This crate decides nothing about *what* the new leader or ISR should
//! be. It transports a proposal and reports the controller's answer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod assemble;
mod error;
mod manager;
mod pending;

pub use assemble::assemble_request;
pub use error::{SyncError, SyncResult};
pub use manager::{BrokerEpochSupplier, IsrSyncManager};
pub use pending::{PendingUpdate, PendingUpdates};
