//! Starling Runtime - collaborator abstractions for synchronization.
//!
//! This crate defines the interfaces the synchronization manager
//! consumes but does not own:
//!
//! - [`ControllerChannel`]: the network path to the active controller,
//!   with an exactly-once completion callback per request
//! - [`Scheduler`]: one-shot delayed execution for retry backoff, with
//!   a production implementation on tokio ([`TokioScheduler`])
//! - [`SyncConfig`]: tunables for the synchronization manager
//!
//! Production channel implementations live with the broker's network
//! stack; tests use recording fakes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod channel;
mod config;
mod scheduler;

pub use channel::{ChannelError, ChannelEvent, Completion, ControllerChannel, SendOutcome};
pub use config::{ConfigError, SyncConfig};
pub use scheduler::{ScheduledTask, Scheduler, TokioScheduler};
