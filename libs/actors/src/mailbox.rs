//! Actor Mailbox
//!
//! Two bounded FIFO queues per actor: a system lane for control traffic and
//! a user lane for application payloads. Every operation is non-blocking;
//! a full lane rejects the message and hands it back to the sender.

use crate::error::SendError;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::fmt;

/// Which queue of a mailbox a message travels through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Control and lifecycle signals, always drained first
    System,
    /// Application payloads
    User,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::System => write!(f, "system"),
            Lane::User => write!(f, "user"),
        }
    }
}

/// One bounded multi-producer queue
struct BoundedQueue<M> {
    lane: Lane,
    capacity: usize,
    sender: Sender<M>,
    receiver: Receiver<M>,
}

impl<M> BoundedQueue<M> {
    fn new(lane: Lane, capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            lane,
            capacity,
            sender,
            receiver,
        }
    }

    fn offer(&self, message: M) -> Result<(), SendError<M>> {
        self.sender.try_send(message).map_err(|err| match err {
            TrySendError::Full(message) => SendError::MailboxFull {
                lane: self.lane,
                capacity: self.capacity,
                message,
            },
            TrySendError::Disconnected(message) => SendError::Closed {
                lane: self.lane,
                message,
            },
        })
    }

    fn poll(&self) -> Option<M> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn len(&self) -> usize {
        self.receiver.len()
    }
}

/// Bounded system and user queues for a single actor
pub struct Mailbox<M> {
    system: BoundedQueue<M>,
    user: BoundedQueue<M>,
}

impl<M> Mailbox<M> {
    /// Create a mailbox whose lanes each hold up to `capacity` messages
    ///
    /// Slots are allocated up front. Actor systems only build mailboxes from
    /// validated settings, which cap `capacity` at
    /// `actor_config::defaults::mailbox::MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        Self {
            system: BoundedQueue::new(Lane::System, capacity),
            user: BoundedQueue::new(Lane::User, capacity),
        }
    }

    pub fn enqueue_system(&self, message: M) -> Result<(), SendError<M>> {
        self.system.offer(message)
    }

    pub fn enqueue_user(&self, message: M) -> Result<(), SendError<M>> {
        self.user.offer(message)
    }

    pub fn enqueue(&self, lane: Lane, message: M) -> Result<(), SendError<M>> {
        match lane {
            Lane::System => self.enqueue_system(message),
            Lane::User => self.enqueue_user(message),
        }
    }

    pub fn try_dequeue_system(&self) -> Option<M> {
        self.system.poll()
    }

    pub fn try_dequeue_user(&self) -> Option<M> {
        self.user.poll()
    }

    /// Pop the next message, system lane first
    pub fn try_dequeue(&self) -> Option<(Lane, M)> {
        if let Some(message) = self.try_dequeue_system() {
            return Some((Lane::System, message));
        }
        self.try_dequeue_user().map(|message| (Lane::User, message))
    }

    /// Capacity of each lane
    pub fn capacity(&self) -> usize {
        self.user.capacity
    }

    pub fn len(&self, lane: Lane) -> usize {
        match lane {
            Lane::System => self.system.len(),
            Lane::User => self.user.len(),
        }
    }

    /// Messages waiting across both lanes
    pub fn pending(&self) -> usize {
        self.system.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }
}

impl<M> fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("capacity", &self.capacity())
            .field("system", &self.system.len())
            .field("user", &self.user.len())
            .finish()
    }
}
