//! Propagation coordinator and response classifier.
//!
//! Many threads submit proposed partition states concurrently; this
//! module coalesces them into batched controller requests, enforces a
//! single in-flight request, and routes each partition's verdict back
//! to its caller.
//!
//! # Send cycle
//!
//! ```text
//! submit ──> pending store ──> maybe_propagate ──┐
//!                                                ├──> snapshot ──> assemble ──> channel
//! retry task ────────────────────────────────────┘                                │
//!                 completion (exactly once) <────────────────────────────────────┘
//!                 │
//!                 ├─ top-level success ──> resolve per-partition futures, drain again
//!                 └─ top-level retryable ──> schedule one retry, entries untouched
//! ```
//!
//! The only shared mutable state is the pending store and the in-flight
//! flag; both are lock-free, so the submit path never blocks even under
//! high partition counts. The in-flight token is taken at dispatch and
//! held until the response's reconciliation completes, so no two send
//! cycles run concurrently and the classifier has single-writer access
//! to the entries of its snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use starling_core::{
    BrokerEpoch, BrokerId, CommittedIsr, ErrorCode, LeaderRecoveryState, ProposedIsr,
    SyncResponse, TopicPartition,
};
use starling_runtime::{ChannelEvent, ControllerChannel, Scheduler, SendOutcome, SyncConfig};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::assemble::assemble_request;
use crate::error::{SyncError, SyncResult};
use crate::pending::{PendingUpdate, PendingUpdates};

/// Label for the retry task handed to the scheduler.
const RETRY_TASK_LABEL: &str = "partition-state-retry";

/// Supplies the broker's current epoch.
///
/// Evaluated fresh at every send; the epoch changes across broker
/// re-registrations and a cached value would get whole batches rejected
/// with `STALE_BROKER_EPOCH`.
pub type BrokerEpochSupplier = Arc<dyn Fn() -> BrokerEpoch + Send + Sync>;

/// Releases the in-flight token when dropped, panics included.
///
/// The token must stay held through reconciliation: a submit racing the
/// response handler must not start a cycle that snapshots entries the
/// current response is about to resolve. Otherwise that second cycle
/// can later resolve a fresh resubmission with this cycle's stale
/// verdict, and the resubmitted proposal is never sent.
struct InflightToken<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InflightToken<'a> {
    const fn held(flag: &'a AtomicBool) -> Self {
        Self { flag }
    }
}

impl Drop for InflightToken<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// What to do after a send cycle completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Drain remaining pending entries right away.
    Immediate,
    /// Wait out the retry backoff; the controller is unhealthy or our
    /// epoch is stale.
    Backoff,
}

/// Coordinates propagation of partition-state updates to the controller.
///
/// Construction yields an `Arc` because send completions and retry
/// tasks hold a reference back into the manager.
pub struct IsrSyncManager {
    /// This broker's id, stamped on every request.
    broker_id: BrokerId,
    /// Fresh broker epoch for each send.
    broker_epoch: BrokerEpochSupplier,
    /// Channel to the active controller.
    channel: Arc<dyn ControllerChannel>,
    /// Delayed-task scheduler for retry backoff.
    scheduler: Arc<dyn Scheduler>,
    /// Tunables.
    config: SyncConfig,
    /// Accepted updates not yet resolved by a response.
    pending: PendingUpdates,
    /// Single process-wide in-flight token: at most one batched request
    /// to the controller at a time, across all partitions.
    inflight: AtomicBool,
}

impl IsrSyncManager {
    /// Creates a new manager.
    #[must_use]
    pub fn new(
        broker_id: BrokerId,
        broker_epoch: BrokerEpochSupplier,
        channel: Arc<dyn ControllerChannel>,
        scheduler: Arc<dyn Scheduler>,
        config: SyncConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            broker_id,
            broker_epoch,
            channel,
            scheduler,
            config,
            pending: PendingUpdates::new(),
            inflight: AtomicBool::new(false),
        })
    }

    /// Starts the underlying controller channel.
    pub fn start(&self) {
        info!(broker_id = self.broker_id.get(), "starting partition-state synchronization");
        self.channel.start();
    }

    /// Shuts down the underlying controller channel. Pending completion
    /// handles are left unresolved; their receivers observe the senders
    /// being dropped when the manager itself is dropped.
    pub fn shutdown(&self) {
        info!(broker_id = self.broker_id.get(), "stopping partition-state synchronization");
        self.channel.shutdown();
    }

    /// Submits a proposed leader-and-ISR state for one partition.
    ///
    /// Returns immediately with a completion handle that resolves
    /// exactly once: with the controller's authoritative state, or with
    /// a definitive per-partition failure. If an update for the same
    /// partition is already pending, the handle resolves immediately
    /// with [`SyncError::AlreadyPending`] and the prior update is left
    /// untouched; the caller resubmits with fresh state once it
    /// resolves.
    ///
    /// Never blocks: top-level transient errors are retried internally
    /// and do not resolve the handle.
    pub fn submit(
        self: &Arc<Self>,
        partition: TopicPartition,
        proposed: ProposedIsr,
    ) -> oneshot::Receiver<SyncResult<CommittedIsr>> {
        let (tx, rx) = oneshot::channel();
        let update = PendingUpdate::new(proposed, tx);

        match self.pending.try_insert(partition, update) {
            Ok(()) => {
                debug!(%partition, "accepted partition-state update");
                self.maybe_propagate();
            }
            Err(rejected) => {
                debug!(%partition, "rejected update: a prior update is still pending");
                // The receiver is live (we hold rx), so this cannot fail.
                let _ = rejected
                    .completion
                    .send(Err(SyncError::AlreadyPending { partition }));
            }
        }

        rx
    }

    /// Returns the number of updates currently pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if an update for `partition` is pending.
    #[must_use]
    pub fn is_pending(&self, partition: &TopicPartition) -> bool {
        self.pending.contains(partition)
    }

    /// Starts a send cycle if one is warranted and none is in flight.
    ///
    /// Invoked after every accepted submission and after every completed
    /// send cycle. A burst of submissions arriving while a request is
    /// outstanding rides along in the next cycle; none of them triggers
    /// its own round trip.
    fn maybe_propagate(self: &Arc<Self>) {
        loop {
            if self.pending.is_empty() {
                return;
            }
            if self
                .inflight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // A cycle is active or about to start; it (or the retry
                // it schedules) will pick up these entries.
                return;
            }

            let snapshot = self.pending.snapshot();
            if snapshot.is_empty() {
                // Raced with a response handler that drained the last
                // entries between the emptiness check and the snapshot.
                // Release the token and look again.
                self.inflight.store(false, Ordering::Release);
                continue;
            }

            self.dispatch(snapshot);
            return;
        }
    }

    /// Assembles and sends one batched request for `snapshot`.
    ///
    /// Caller must hold the in-flight token.
    fn dispatch(self: &Arc<Self>, snapshot: Vec<(TopicPartition, ProposedIsr)>) {
        let broker_epoch = (self.broker_epoch)();
        let request = assemble_request(self.broker_id, broker_epoch, &snapshot);
        let sent: Vec<TopicPartition> = snapshot.into_iter().map(|(key, _)| key).collect();

        debug!(
            broker_epoch = broker_epoch.get(),
            topics = request.topics.len(),
            partitions = sent.len(),
            "sending partition-state request to controller"
        );

        let manager = Arc::clone(self);
        self.channel.send(
            request,
            Box::new(move |event| manager.handle_send_event(&sent, event)),
        );
    }

    /// Classifies the outcome of one send attempt and dispatches the
    /// consequences. Invoked exactly once per attempt, from the
    /// channel's task.
    ///
    /// The in-flight token stays held until classification and
    /// reconciliation finish, then is released before the continuation
    /// runs. The guard clears it on every exit path; a missed release
    /// wedges propagation for the life of the process.
    ///
    /// # Panics
    /// Panics on [`ChannelEvent::TimedOut`]. The channel is contracted
    /// to retry internally and never surface a timeout; observing one is
    /// a broken collaborator, not a condition to recover from.
    fn handle_send_event(self: &Arc<Self>, sent: &[TopicPartition], event: ChannelEvent) {
        let continuation = {
            let _token = InflightToken::held(&self.inflight);

            match event {
                ChannelEvent::TimedOut => {
                    panic!(
                        "controller channel surfaced a timeout; its contract is to retry internally"
                    )
                }
                ChannelEvent::Complete(SendOutcome::Failed(err)) => {
                    warn!(
                        error = %err,
                        partitions = sent.len(),
                        "partition-state request failed; retrying after backoff"
                    );
                    Continuation::Backoff
                }
                ChannelEvent::Complete(SendOutcome::Response(response)) => {
                    self.classify_response(sent, &response)
                }
            }
        };

        match continuation {
            Continuation::Immediate => self.maybe_propagate(),
            Continuation::Backoff => self.schedule_retry(),
        }
    }

    /// Interprets the top-level status of a structured response.
    fn classify_response(
        self: &Arc<Self>,
        sent: &[TopicPartition],
        response: &SyncResponse,
    ) -> Continuation {
        match response.error {
            ErrorCode::None => {
                self.reconcile(sent, response);
                Continuation::Immediate
            }
            ErrorCode::StaleBrokerEpoch => {
                // The next cycle re-reads the epoch; entries untouched.
                info!("controller reports stale broker epoch; retrying with a refreshed epoch");
                Continuation::Backoff
            }
            ErrorCode::ClusterAuthorizationFailed => {
                error!("broker is not authorized to update partition state; retrying after backoff");
                Continuation::Backoff
            }
            code => {
                warn!(%code, "unexpected top-level status from controller; retrying after backoff");
                Continuation::Backoff
            }
        }
    }

    /// Resolves per-partition outcomes after a top-level success.
    ///
    /// Every partition of this send that the response accounts for is
    /// removed from the pending store and its handle resolved. A sent
    /// partition the response omits stays pending for the next cycle.
    fn reconcile(&self, sent: &[TopicPartition], response: &SyncResponse) {
        let mut outcomes: HashMap<TopicPartition, SyncResult<CommittedIsr>> =
            HashMap::with_capacity(sent.len());

        for topic in &response.topics {
            for partition in &topic.partitions {
                let key = TopicPartition::new(topic.topic_id, partition.partition);
                let outcome = if partition.error.is_ok() {
                    // Validate the recovery marker per partition so one
                    // malformed entry cannot corrupt the rest.
                    match LeaderRecoveryState::from_code(partition.leader_recovery) {
                        Some(leader_recovery) => Ok(CommittedIsr {
                            leader: partition.leader,
                            leader_epoch: partition.leader_epoch,
                            isr: partition.isr.clone(),
                            leader_recovery,
                            partition_epoch: partition.partition_epoch,
                        }),
                        None => Err(SyncError::InvalidLeaderRecovery {
                            partition: key,
                            code: partition.leader_recovery,
                        }),
                    }
                } else {
                    Err(SyncError::Controller {
                        partition: key,
                        code: partition.error,
                    })
                };
                if outcomes.insert(key, outcome).is_some() {
                    warn!(%key, "controller response listed a partition twice; keeping the last outcome");
                }
            }
        }

        for key in sent {
            match outcomes.remove(key) {
                Some(outcome) => {
                    let Some(update) = self.pending.remove(key) else {
                        // The in-flight token is held, so no other cycle
                        // can have resolved this key; tolerate a channel
                        // that double-delivered a completion.
                        debug!(%key, "no pending entry for completed partition");
                        continue;
                    };
                    match &outcome {
                        Ok(state) => debug!(
                            %key,
                            leader = state.leader.get(),
                            leader_epoch = state.leader_epoch.get(),
                            partition_epoch = state.partition_epoch.get(),
                            "partition state committed"
                        ),
                        Err(err) => debug!(%key, error = %err, "partition update rejected"),
                    }
                    // The caller may have dropped its receiver; ignore.
                    let _ = update.completion.send(outcome);
                }
                None => {
                    warn!(
                        %key,
                        "controller response omitted a sent partition; leaving it pending for the next cycle"
                    );
                }
            }
        }

        if !outcomes.is_empty() {
            debug!(
                count = outcomes.len(),
                "controller response contained partitions outside this batch"
            );
        }
    }

    /// Schedules exactly one re-propagation after the configured backoff.
    fn schedule_retry(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        self.scheduler.schedule_once(
            RETRY_TASK_LABEL,
            self.config.retry_backoff,
            Box::new(move || manager.maybe_propagate()),
        );
    }
}
