//! Actor Behavior
//!
//! The handler side of a cell: the code that actually receives messages.

use crate::Result;
use tracing::debug;

/// Trait for actor behavior
///
/// `receive` is called once per delivered message and never concurrently
/// with another call on the same actor, so `&mut self` state needs no locks.
/// Returning an error does not stop the actor; the processing task records
/// it and moves on to the next message.
pub trait Actor: Send + 'static {
    type Message: Send + 'static;

    /// Handle a user message
    fn receive(&mut self, msg: Self::Message) -> Result<()>;

    /// Handle a message from the system lane
    fn receive_system(&mut self, msg: Self::Message) -> Result<()> {
        debug!(
            actor_type = std::any::type_name::<Self>(),
            "Received system message"
        );
        self.receive(msg)
    }
}
