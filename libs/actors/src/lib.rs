//! Cell-Scheduled Actor Runtime
//!
//! Per-actor mailboxes drained by transient processing tasks. There is no
//! thread per actor: the first sender that finds a cell idle dispatches one
//! drain pass, everyone else just enqueues and leaves the work to that pass.
//!
//! # Architecture
//!
//! ```text
//!  senders ──tell──────────────┐
//!          ──send_system_msg──┐│
//!                             ▼▼
//! ┌────────────────────────────────────────────┐
//! │ ActorCell                                  │
//! │  ┌──────────────┐   has_more_messages      │
//! │  │ system queue │   scheduler_status       │
//! │  │ user queue   │   (Idle ──CAS──▶ Busy)   │
//! │  └──────┬───────┘            │             │
//! │         │ batch_size msgs    │ winner only │
//! │         ▼                    ▼             │
//! │   Actor::receive ◀─── drain pass ◀── Dispatcher
//! │                        │                   │
//! │                        └─ Idle, re-arm ────┘
//! └────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - **Mutual exclusion**: at most one drain pass per cell at any instant
//! - **No lost wakeups**: work announced while a pass finishes is re-armed
//! - **Priority**: system messages before user messages within a pass
//! - **FIFO** within each queue
//! - **Fairness**: a pass handles at most `batch_size` messages
//!
//! # Examples
//!
//! ```rust
//! use cell_actors::{Actor, ActorSystem, ManualDispatcher, Result};
//! use actor_config::MailboxSettings;
//! use std::sync::Arc;
//!
//! struct Greeter {
//!     greeted: usize,
//! }
//!
//! impl Actor for Greeter {
//!     type Message = String;
//!
//!     fn receive(&mut self, name: String) -> Result<()> {
//!         self.greeted += 1;
//!         println!("Hello {}", name);
//!         Ok(())
//!     }
//! }
//!
//! let dispatcher = Arc::new(ManualDispatcher::new());
//! let system = ActorSystem::new(MailboxSettings::default(), dispatcher.clone()).unwrap();
//! let greeter = system.actor_of(Greeter { greeted: 0 });
//!
//! greeter.tell("Roger".to_string()).unwrap();
//! greeter.tell("Go".to_string()).unwrap();
//! dispatcher.run_until_idle();
//!
//! assert_eq!(greeter.stats().user_delivered, 2);
//! ```

pub mod actor;
pub mod actor_ref;
pub mod cell;
pub mod dispatcher;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod system;

pub use actor::Actor;
pub use actor_ref::ActorRef;
pub use cell::{ActorCell, SchedulerStatus};
pub use dispatcher::{Dispatcher, ManualDispatcher, Runnable, ThreadDispatcher, TokioDispatcher};
pub use error::{ActorError, DispatchError, Result, SendError};
pub use mailbox::{Lane, Mailbox};
pub use message::AnyMessage;
pub use metrics::{CellMetrics, CellStats};
pub use registry::{ActorId, ActorRegistry, CellEntry};
pub use system::ActorSystem;

pub use actor_config::MailboxSettings;
