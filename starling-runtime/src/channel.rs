//! Controller channel abstraction.
//!
//! The channel owns controller discovery and the network path to the
//! current controller. The synchronization manager only ever hands it a
//! request and a completion callback; it never blocks on the wire.
//!
//! # Contract
//!
//! - The completion is invoked exactly once per request, from the
//!   channel's own task.
//! - Transport-level problems are retried internally against the current
//!   controller; the channel surfaces a definitive failure only when the
//!   request cannot be delivered in a form worth retrying verbatim
//!   (authentication, version negotiation, or a dropped connection that
//!   invalidated the request).
//! - `ChannelEvent::TimedOut` is never delivered in normal operation.
//!   The manager treats an observed timeout as a contract violation.

use starling_core::{SyncRequest, SyncResponse};
use thiserror::Error;

/// Definitive send failures surfaced by the channel.
///
/// All variants are top-level retryable from the manager's point of
/// view: no pending update is resolved, the whole batch is retried
/// after a backoff.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The controller rejected our credentials.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Failure detail from the security layer.
        message: String,
    },

    /// The controller does not support the request version.
    #[error("unsupported protocol version: {message}")]
    UnsupportedVersion {
        /// Failure detail from version negotiation.
        message: String,
    },

    /// The connection failed in a way the channel could not absorb.
    #[error("transport failure: {message}")]
    Transport {
        /// Failure detail from the transport.
        message: String,
    },
}

/// Outcome of a completed send attempt.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The controller answered with a structured response.
    Response(SyncResponse),
    /// The send failed definitively; see [`ChannelError`].
    Failed(ChannelError),
}

/// Event delivered to a request's completion callback.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The send attempt completed, with a response or a failure.
    Complete(SendOutcome),
    /// The request timed out inside the channel. Contractually this
    /// should never happen; the channel retries internally forever.
    TimedOut,
}

/// Completion callback, invoked exactly once per request.
pub type Completion = Box<dyn FnOnce(ChannelEvent) + Send + 'static>;

/// A channel to the active cluster controller.
///
/// Implementations route requests to whichever node is currently the
/// controller, re-discovering it as needed. `send` is a fire-and-forget
/// enqueue; the result arrives via the completion.
pub trait ControllerChannel: Send + Sync + 'static {
    /// Starts the channel's background machinery.
    fn start(&self);

    /// Shuts the channel down. In-flight completions may be dropped;
    /// callers observe this as their completion never firing.
    fn shutdown(&self);

    /// Enqueues a request. The completion is invoked exactly once with
    /// the outcome, from the channel's own task.
    fn send(&self, request: SyncRequest, completion: Completion);
}
