//! Actor References
//!
//! The handle senders hold. Cloning is cheap and every clone reaches the
//! same cell.

use crate::cell::ActorCell;
use crate::error::{DispatchError, SendError};
use crate::mailbox::Lane;
use crate::metrics::CellStats;
use crate::registry::{ActorId, CellEntry};
use std::fmt;
use std::sync::Arc;

/// Actor reference for fire-and-forget messaging
pub struct ActorRef<M: Send + 'static> {
    cell: Arc<ActorCell<M>>,
}

impl<M: Send + 'static> ActorRef<M> {
    pub(crate) fn new(cell: Arc<ActorCell<M>>) -> Self {
        Self { cell }
    }

    /// Send an application message
    ///
    /// Returns as soon as the message is queued; it never waits for the
    /// actor to process it. A full user queue hands the message back.
    pub fn tell(&self, msg: M) -> Result<(), SendError<M>> {
        self.cell.post(Lane::User, msg)
    }

    /// Send a message on the system lane, which is drained before user messages
    pub fn send_system_message(&self, msg: M) -> Result<(), SendError<M>> {
        self.cell.post(Lane::System, msg)
    }

    /// Get actor ID
    pub fn id(&self) -> &ActorId {
        self.cell.id()
    }

    pub fn stats(&self) -> CellStats {
        self.cell.metrics().snapshot()
    }

    /// True when no processing task owns the cell
    pub fn is_idle(&self) -> bool {
        CellEntry::is_idle(&*self.cell)
    }

    /// Messages queued but not yet delivered
    pub fn pending_messages(&self) -> usize {
        self.cell.pending_messages()
    }

    /// True when queued messages wait for a pass that was never started
    pub fn is_stranded(&self) -> bool {
        self.cell.is_stranded()
    }

    /// Retry scheduling without sending, e.g. once a refusing dispatcher
    /// accepts work again. A no-op when a pass already owns the cell.
    pub fn reschedule(&self) -> Result<(), DispatchError> {
        if self.cell.pending_messages() == 0 {
            return Ok(());
        }
        self.cell.request_schedule()
    }
}

impl<M: Send + 'static> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<M: Send + 'static> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<M: Send + 'static> Eq for ActorRef<M> {}

impl<M: Send + 'static> fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("id", self.id())
            .finish()
    }
}
