//! Actor Runtime Error Types
//!
//! Errors surfaced to senders (mailbox overflow, dispatch refusal) and
//! errors reported by handlers back to the processing task.

use crate::mailbox::Lane;
use thiserror::Error;

/// Errors produced while handling a message or building the runtime
#[derive(Error, Debug)]
pub enum ActorError {
    /// The handler does not know how to interpret the message shape
    #[error("Unrecognized message: {type_name}")]
    UnrecognizedMessage { type_name: String },

    /// The handler failed while processing a message
    #[error("Handler error: {message}")]
    Handler {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The handler panicked; the panic was contained by the processing task
    #[error("Handler panicked: {message}")]
    HandlerPanic { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// The dispatcher refused to run a processing task
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Result type alias for actor operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create an unrecognized-message error
    pub fn unrecognized(type_name: impl Into<String>) -> Self {
        Self::UnrecognizedMessage {
            type_name: type_name.into(),
        }
    }

    /// Create a handler error
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Create a handler error with source
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// Short label used as a structured logging field
    pub fn category(&self) -> &'static str {
        match self {
            ActorError::UnrecognizedMessage { .. } => "unrecognized_message",
            ActorError::Handler { .. } => "handler",
            ActorError::HandlerPanic { .. } => "handler_panic",
            ActorError::Configuration { .. } => "configuration",
            ActorError::Dispatch(_) => "dispatch",
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ActorError::UnrecognizedMessage { .. })
    }
}

/// A dispatcher could not accept a processing task
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to spawn drain thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("Dispatcher '{name}' is shut down")]
    Shutdown { name: String },
}

/// Failure to hand a message to an actor
///
/// Rejections carry the message back so the sender decides what to do with it.
#[derive(Error, Debug)]
pub enum SendError<M> {
    /// The target queue is at capacity; nothing was enqueued
    #[error("Mailbox full: {lane} queue at capacity {capacity}")]
    MailboxFull {
        lane: Lane,
        capacity: usize,
        message: M,
    },

    /// The target queue no longer accepts messages
    #[error("Mailbox closed: {lane} queue")]
    Closed { lane: Lane, message: M },

    /// The message was enqueued but no processing task could be started.
    /// It stays queued and is delivered by the next successful schedule.
    #[error("Message queued but dispatch failed: {source}")]
    Dispatch {
        #[source]
        source: DispatchError,
    },
}

impl<M> SendError<M> {
    pub fn is_mailbox_full(&self) -> bool {
        matches!(self, SendError::MailboxFull { .. })
    }

    /// Recover the rejected message, if it was not enqueued
    pub fn into_message(self) -> Option<M> {
        match self {
            SendError::MailboxFull { message, .. } | SendError::Closed { message, .. } => {
                Some(message)
            }
            SendError::Dispatch { .. } => None,
        }
    }
}

impl<M> From<DispatchError> for SendError<M> {
    fn from(source: DispatchError) -> Self {
        SendError::Dispatch { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let err = ActorError::unrecognized("i32");
        assert_eq!(err.to_string(), "Unrecognized message: i32");
        assert_eq!(err.category(), "unrecognized_message");
        assert!(err.is_unrecognized());

        let err = ActorError::configuration("batch size must be positive", Some("batch_size"));
        assert_eq!(err.category(), "configuration");
        assert!(!err.is_unrecognized());
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = ActorError::handler_with_source("persist failed", io);
        assert_eq!(err.to_string(), "Handler error: persist failed");
        assert!(std::error::Error::source(&err).is_some());
        match err {
            ActorError::Handler { source, .. } => assert!(source.is_some()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_send_error_returns_rejected_message() {
        let err: SendError<&str> = SendError::MailboxFull {
            lane: Lane::User,
            capacity: 2,
            message: "third",
        };
        assert!(err.is_mailbox_full());
        assert_eq!(err.to_string(), "Mailbox full: user queue at capacity 2");
        assert_eq!(err.into_message(), Some("third"));

        let err: SendError<&str> = DispatchError::Shutdown {
            name: "manual".to_string(),
        }
        .into();
        assert!(!err.is_mailbox_full());
        assert_eq!(err.into_message(), None);
    }
}
