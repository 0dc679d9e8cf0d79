//! Actor Cell
//!
//! Couples one mailbox with one actor and decides, without locks, when a
//! processing task has to be started.
//!
//! # Handoff protocol
//!
//! Every enqueue raises `has_more_messages` and then tries to move
//! `scheduler_status` from `Idle` to `Busy`. Only the caller that wins that
//! compare-and-swap dispatches a processing task; everyone else relies on
//! the task that is already running or about to run.
//!
//! The processing task clears `has_more_messages`, handles at most
//! `batch_size` messages (system lane first) and goes back to `Idle`. It then
//! re-reads both flags: a sender may have raised `has_more_messages` while
//! the status still read `Busy`, in which case nobody dispatched for it.
//! If the flag is set and the status is `Idle`, the task competes for the
//! handoff again and dispatches a fresh pass when it wins.
//!
//! Flags use `SeqCst`: the sender's flag store and the task's `Idle` store
//! must not both be missed by the other side's subsequent load.

use crate::actor::Actor;
use crate::dispatcher::Dispatcher;
use crate::error::{ActorError, DispatchError, SendError};
use crate::mailbox::{Lane, Mailbox};
use crate::metrics::{CellMetrics, CellStats};
use crate::registry::{ActorId, CellEntry};
use actor_config::MailboxSettings;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Whether a processing task owns the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerStatus {
    /// No processing task is running or pending
    Idle = 0,
    /// A processing task is running or has been dispatched
    Busy = 1,
}

impl SchedulerStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerStatus::Idle,
            _ => SchedulerStatus::Busy,
        }
    }
}

const IDLE: u8 = SchedulerStatus::Idle as u8;
const BUSY: u8 = SchedulerStatus::Busy as u8;

/// Mailbox, actor and scheduling state for one actor
pub struct ActorCell<M: Send + 'static> {
    id: ActorId,
    mailbox: Mailbox<M>,
    /// Only the processing task that owns `Busy` ever locks this
    actor: Mutex<Box<dyn Actor<Message = M>>>,
    dispatcher: Arc<dyn Dispatcher>,
    batch_size: usize,
    scheduler_status: AtomicU8,
    has_more_messages: AtomicBool,
    metrics: CellMetrics,
}

impl<M: Send + 'static> ActorCell<M> {
    pub(crate) fn new<A>(
        id: ActorId,
        actor: A,
        settings: MailboxSettings,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Arc<Self>
    where
        A: Actor<Message = M>,
    {
        Arc::new(Self {
            id,
            mailbox: Mailbox::new(settings.capacity),
            actor: Mutex::new(Box::new(actor)),
            dispatcher,
            batch_size: settings.batch_size,
            scheduler_status: AtomicU8::new(IDLE),
            has_more_messages: AtomicBool::new(false),
            metrics: CellMetrics::default(),
        })
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus::from_u8(self.scheduler_status.load(Ordering::SeqCst))
    }

    pub fn has_more_messages(&self) -> bool {
        self.has_more_messages.load(Ordering::SeqCst)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub(crate) fn mailbox(&self) -> &Mailbox<M> {
        &self.mailbox
    }

    pub fn metrics(&self) -> &CellMetrics {
        &self.metrics
    }

    /// Messages queued but not yet delivered
    pub fn pending_messages(&self) -> usize {
        self.mailbox.pending()
    }

    /// Enqueue into `lane` and make sure a processing task will see it
    pub fn post(self: &Arc<Self>, lane: Lane, message: M) -> Result<(), SendError<M>> {
        if let Err(err) = self.mailbox.enqueue(lane, message) {
            if err.is_mailbox_full() {
                self.metrics.record_mailbox_full();
                warn!(
                    actor_id = %self.id,
                    %lane,
                    capacity = self.mailbox.capacity(),
                    "Mailbox full, message rejected"
                );
            }
            return Err(err);
        }
        self.metrics.record_enqueued(lane);
        self.request_schedule().map_err(SendError::from)
    }

    /// Announce new work and start a processing task if none owns the cell
    pub fn request_schedule(self: &Arc<Self>) -> Result<(), DispatchError> {
        self.has_more_messages.store(true, Ordering::SeqCst);
        self.try_schedule().map(drop).map_err(|err| {
            error!(
                actor_id = %self.id,
                dispatcher = self.dispatcher.name(),
                error = %err,
                "Failed to dispatch processing task"
            );
            err
        })
    }

    /// Compete for the Idle -> Busy handoff; the winner dispatches one pass.
    /// Returns whether this caller dispatched.
    fn try_schedule(self: &Arc<Self>) -> Result<bool, DispatchError> {
        if self
            .scheduler_status
            .compare_exchange(IDLE, BUSY, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(false);
        }

        // A refused task is dropped before dispatch returns, and dropping it
        // hands the cell back to Idle.
        let task = PassTask {
            cell: Some(Arc::clone(self)),
        };
        self.dispatcher
            .dispatch(Box::new(move || task.run()))
            .map(|()| true)
    }

    /// The dispatched pass will never run: release the cell and keep the
    /// work announced for the next schedule attempt.
    fn abandon_pass(&self) {
        self.has_more_messages.store(true, Ordering::SeqCst);
        self.scheduler_status.store(IDLE, Ordering::SeqCst);
        self.metrics.record_dispatch_failure();
        warn!(
            actor_id = %self.id,
            dispatcher = self.dispatcher.name(),
            pending = self.mailbox.pending(),
            "Processing task dropped before it ran"
        );
    }

    /// Idle with announced work that no processing task will pick up.
    /// Happens when the dispatcher refused or dropped a pass;
    /// `request_schedule` or any further send recovers it.
    pub fn is_stranded(&self) -> bool {
        self.status() == SchedulerStatus::Idle
            && self.has_more_messages()
            && !self.mailbox.is_empty()
    }

    /// One drain pass. Runs on the dispatcher, never concurrently with
    /// another pass for the same cell.
    fn process_messages(self: Arc<Self>) {
        self.has_more_messages.store(false, Ordering::SeqCst);
        {
            let _idle = IdleOnDrop { cell: &*self };
            let processed = self.drain_batch();
            self.metrics.record_pass(processed);
            debug!(
                actor_id = %self.id,
                processed,
                batch_size = self.batch_size,
                "Drain pass complete"
            );
        }
        self.rearm();
    }

    /// Handle up to `batch_size` messages, system lane first.
    fn drain_batch(&self) -> usize {
        let mut actor = self.actor.lock();
        let mut processed = 0;
        while processed < self.batch_size {
            let Some((lane, message)) = self.mailbox.try_dequeue() else {
                return processed;
            };
            self.invoke(&mut **actor, lane, message);
            processed += 1;
        }

        // Stopped by the bound, not by an empty mailbox
        if !self.mailbox.is_empty() {
            self.has_more_messages.store(true, Ordering::SeqCst);
        }
        processed
    }

    fn invoke(&self, actor: &mut dyn Actor<Message = M>, lane: Lane, message: M) {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match lane {
            Lane::System => actor.receive_system(message),
            Lane::User => actor.receive(message),
        }));
        self.metrics.record_delivered(lane, start.elapsed());

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_unrecognized() => {
                self.metrics.record_unrecognized();
                warn!(
                    actor_id = %self.id,
                    %lane,
                    error = %err,
                    "Unrecognized message skipped"
                );
            }
            Ok(Err(err)) => {
                self.metrics.record_handler_failure();
                error!(
                    actor_id = %self.id,
                    %lane,
                    error = %err,
                    error_category = err.category(),
                    "Actor message processing failed"
                );
            }
            Err(payload) => {
                self.metrics.record_handler_panic();
                let err = ActorError::HandlerPanic {
                    message: panic_message(&*payload),
                };
                error!(
                    actor_id = %self.id,
                    %lane,
                    error = %err,
                    error_category = err.category(),
                    "Actor handler panicked, continuing with next message"
                );
            }
        }
    }

    /// Close the window between a sender seeing `Busy` and the pass going
    /// `Idle`: if work was announced meanwhile, schedule another pass.
    fn rearm(self: &Arc<Self>) {
        let has_more = self.has_more_messages.load(Ordering::SeqCst);
        let status = self.status();
        if !has_more || status != SchedulerStatus::Idle {
            return;
        }

        match self.try_schedule() {
            Ok(true) => {
                self.metrics.record_rearm();
                debug!(actor_id = %self.id, "Re-armed processing task");
            }
            Ok(false) => {}
            Err(err) => {
                // No sender is waiting on this result
                self.metrics.record_rearm_failure();
                error!(
                    actor_id = %self.id,
                    dispatcher = self.dispatcher.name(),
                    pending = self.mailbox.pending(),
                    error = %err,
                    "Re-arm failed, messages stranded until the next schedule"
                );
            }
        }
    }
}

/// A dispatched drain pass. Dropped without running, it releases the cell.
struct PassTask<M: Send + 'static> {
    cell: Option<Arc<ActorCell<M>>>,
}

impl<M: Send + 'static> PassTask<M> {
    fn run(mut self) {
        if let Some(cell) = self.cell.take() {
            cell.process_messages();
        }
    }
}

impl<M: Send + 'static> Drop for PassTask<M> {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            cell.abandon_pass();
        }
    }
}

/// Returns the cell to `Idle` when a pass ends, including by unwinding.
struct IdleOnDrop<'a, M: Send + 'static> {
    cell: &'a ActorCell<M>,
}

impl<M: Send + 'static> Drop for IdleOnDrop<'_, M> {
    fn drop(&mut self) {
        if thread::panicking() {
            // The pass never reached its re-arm check
            self.cell.has_more_messages.store(true, Ordering::SeqCst);
        }
        self.cell.scheduler_status.store(IDLE, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<M: Send + 'static> CellEntry for ActorCell<M> {
    fn id(&self) -> &ActorId {
        &self.id
    }

    fn stats(&self) -> CellStats {
        self.metrics.snapshot()
    }

    fn is_idle(&self) -> bool {
        self.status() == SchedulerStatus::Idle
    }

    fn pending_messages(&self) -> usize {
        self.mailbox.pending()
    }

    fn is_stranded(&self) -> bool {
        ActorCell::is_stranded(self)
    }
}

impl<M: Send + 'static> fmt::Debug for ActorCell<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorCell")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("has_more_messages", &self.has_more_messages())
            .field("batch_size", &self.batch_size)
            .field("mailbox", &self.mailbox)
            .field("dispatcher", &self.dispatcher.name())
            .finish()
    }
}
