//! Actor System
//!
//! Creates cells, owns them through the registry and shares one dispatcher
//! between all of them. There is no stop protocol: discarding an actor only
//! drops the system's ownership, outstanding refs keep the cell alive.

use crate::actor::Actor;
use crate::actor_ref::ActorRef;
use crate::cell::ActorCell;
use crate::dispatcher::{self, Dispatcher};
use crate::metrics::CellStats;
use crate::registry::{ActorId, ActorRegistry};
use crate::{ActorError, Result};
use actor_config::{MailboxSettings, RuntimeConfig};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Core actor system managing cell creation and ownership
pub struct ActorSystem {
    /// Cells owned by this system
    registry: Arc<ActorRegistry>,

    /// Executor shared by every cell's processing tasks
    dispatcher: Arc<dyn Dispatcher>,

    /// Mailbox bounds for actors created without an override
    settings: MailboxSettings,

    /// System ID for debugging
    system_id: String,
}

impl ActorSystem {
    /// Create a system with validated default mailbox settings
    pub fn new(settings: MailboxSettings, dispatcher: Arc<dyn Dispatcher>) -> Result<Self> {
        validate(&settings)?;
        let system_id = format!("system-{}", Uuid::new_v4().simple());
        info!(
            system_id = %system_id,
            dispatcher = dispatcher.name(),
            capacity = settings.capacity,
            batch_size = settings.batch_size,
            "Creating new actor system"
        );

        Ok(Self {
            registry: Arc::new(ActorRegistry::new()),
            dispatcher,
            settings,
            system_id,
        })
    }

    /// Build the system and dispatcher described by a runtime configuration
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let dispatcher = dispatcher::from_settings(&config.dispatcher)?;
        Self::new(config.mailbox, dispatcher)
    }

    /// Create an actor with the system's mailbox settings
    pub fn actor_of<A: Actor>(&self, actor: A) -> ActorRef<A::Message> {
        self.spawn_cell(actor, self.settings)
    }

    /// Create an actor with its own mailbox settings
    pub fn actor_of_with<A: Actor>(
        &self,
        actor: A,
        settings: MailboxSettings,
    ) -> Result<ActorRef<A::Message>> {
        validate(&settings)?;
        Ok(self.spawn_cell(actor, settings))
    }

    fn spawn_cell<A: Actor>(&self, actor: A, settings: MailboxSettings) -> ActorRef<A::Message> {
        let cell = ActorCell::new(ActorId::new(), actor, settings, Arc::clone(&self.dispatcher));
        self.registry.register(cell.clone());

        debug!(
            actor_id = %cell.id(),
            system_id = %self.system_id,
            actor_type = std::any::type_name::<A>(),
            capacity = settings.capacity,
            batch_size = settings.batch_size,
            "Actor created"
        );
        ActorRef::new(cell)
    }

    /// Discard an actor. Returns false if the system does not own it.
    pub fn stop_actor(&self, actor_id: &ActorId) -> bool {
        let removed = self.registry.unregister(actor_id);
        if removed {
            info!(actor_id = %actor_id, system_id = %self.system_id, "Actor discarded");
        }
        removed
    }

    /// List all actors
    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.registry.ids()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Statistics for one actor
    pub fn actor_stats(&self, actor_id: &ActorId) -> Option<CellStats> {
        self.registry.get(actor_id).map(|cell| cell.stats())
    }

    /// Statistics summed over every actor the system owns
    pub fn stats(&self) -> CellStats {
        let mut total = CellStats::default();
        for cell in self.registry.entries() {
            total += &cell.stats();
        }
        total
    }

    /// True when every actor is idle with an empty mailbox. Stranded actors
    /// still hold messages, so they keep the system from going quiescent.
    pub fn is_quiescent(&self) -> bool {
        self.registry
            .entries()
            .iter()
            .all(|cell| cell.is_idle() && cell.pending_messages() == 0)
    }

    /// Actors whose queued messages wait for a pass that could not be
    /// dispatched
    pub fn stranded_actors(&self) -> Vec<ActorId> {
        self.registry
            .entries()
            .iter()
            .filter(|cell| cell.is_stranded())
            .map(|cell| cell.id().clone())
            .collect()
    }

    /// Poll until quiescent or until `timeout` elapses. Returns whether the
    /// system went quiescent. Meant for drivers and tests, not hot paths.
    pub fn await_quiescence(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_quiescent() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn settings(&self) -> MailboxSettings {
        self.settings
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }
}

fn validate(settings: &MailboxSettings) -> Result<()> {
    settings
        .validate()
        .map_err(|e| ActorError::configuration(format!("{:#}", e), Some("mailbox")))
}

impl Clone for ActorSystem {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            dispatcher: Arc::clone(&self.dispatcher),
            settings: self.settings,
            system_id: self.system_id.clone(),
        }
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("system_id", &self.system_id)
            .field("dispatcher", &self.dispatcher.name())
            .field("settings", &self.settings)
            .field("actors", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ManualDispatcher;
    use actor_config::{DispatcherKind, DispatcherSettings};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Counter {
        total: Arc<AtomicU64>,
    }

    impl Actor for Counter {
        type Message = u64;

        fn receive(&mut self, msg: u64) -> Result<()> {
            self.total.fetch_add(msg, Ordering::SeqCst);
            Ok(())
        }
    }

    fn manual_system() -> (ActorSystem, Arc<ManualDispatcher>) {
        let dispatcher = Arc::new(ManualDispatcher::new());
        let system = ActorSystem::new(MailboxSettings::default(), dispatcher.clone()).unwrap();
        (system, dispatcher)
    }

    #[test]
    fn test_actor_system_creation() {
        let (system, _) = manual_system();
        assert!(system.is_empty());
        assert!(system.system_id().starts_with("system-"));
        assert_eq!(system.settings(), MailboxSettings::new(100, 30));
        assert_eq!(system.dispatcher().name(), "manual");
        assert!(system.is_quiescent());
    }

    #[test]
    fn test_actor_of_registers_actor() {
        let (system, dispatcher) = manual_system();
        let total = Arc::new(AtomicU64::new(0));

        let actor_ref = system.actor_of(Counter {
            total: Arc::clone(&total),
        });
        assert_eq!(system.actor_ids(), vec![actor_ref.id().clone()]);

        actor_ref.tell(2).unwrap();
        actor_ref.tell(3).unwrap();
        assert!(!system.is_quiescent());

        dispatcher.run_until_idle();
        assert!(system.is_quiescent());
        assert_eq!(total.load(Ordering::SeqCst), 5);
        assert_eq!(
            system.actor_stats(actor_ref.id()).unwrap().user_delivered,
            2
        );
    }

    #[test]
    fn test_stats_aggregate_over_actors() {
        let (system, dispatcher) = manual_system();
        let total = Arc::new(AtomicU64::new(0));

        let refs: Vec<_> = (0..3)
            .map(|_| {
                system.actor_of(Counter {
                    total: Arc::clone(&total),
                })
            })
            .collect();
        for (i, actor_ref) in refs.iter().enumerate() {
            for _ in 0..=i {
                actor_ref.tell(1).unwrap();
            }
        }
        dispatcher.run_until_idle();

        let stats = system.stats();
        assert_eq!(stats.user_enqueued, 6);
        assert_eq!(stats.user_delivered, 6);
        assert_eq!(stats.drain_passes, 3);
        assert_eq!(stats.largest_pass, 3);
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_per_actor_settings_override() {
        let (system, _dispatcher) = manual_system();
        let total = Arc::new(AtomicU64::new(0));

        let actor_ref = system
            .actor_of_with(
                Counter {
                    total: Arc::clone(&total),
                },
                MailboxSettings::new(1, 1),
            )
            .unwrap();
        actor_ref.tell(1).unwrap();
        assert!(actor_ref.tell(1).unwrap_err().is_mailbox_full());

        let err = system
            .actor_of_with(Counter { total }, MailboxSettings::new(0, 1))
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_invalid_default_settings_rejected() {
        let err = ActorSystem::new(
            MailboxSettings::new(10, 0),
            Arc::new(ManualDispatcher::new()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_oversized_capacity_rejected_before_allocation() {
        let oversized = MailboxSettings::new(1 << 60, 30);
        let err = ActorSystem::new(oversized, Arc::new(ManualDispatcher::new())).unwrap_err();
        assert_eq!(err.category(), "configuration");
        assert!(err.to_string().contains("exceeds the maximum"));

        let (system, _) = manual_system();
        let err = system
            .actor_of_with(
                Counter {
                    total: Arc::new(AtomicU64::new(0)),
                },
                oversized,
            )
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
        assert!(system.is_empty());
    }

    #[test]
    fn test_stop_actor_discards_ownership() {
        let (system, dispatcher) = manual_system();
        let total = Arc::new(AtomicU64::new(0));
        let actor_ref = system.actor_of(Counter {
            total: Arc::clone(&total),
        });

        assert!(system.stop_actor(actor_ref.id()));
        assert!(!system.stop_actor(actor_ref.id()));
        assert!(system.is_empty());

        // Refs handed out earlier keep the cell alive
        actor_ref.tell(4).unwrap();
        dispatcher.run_until_idle();
        assert_eq!(total.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_from_config_thread_dispatcher() {
        let config = RuntimeConfig {
            mailbox: MailboxSettings::new(8, 2),
            dispatcher: DispatcherSettings {
                kind: DispatcherKind::Thread,
                thread_name_prefix: "cfg".to_string(),
            },
            ..Default::default()
        };
        let system = ActorSystem::from_config(&config).unwrap();
        let total = Arc::new(AtomicU64::new(0));
        let actor_ref = system.actor_of(Counter {
            total: Arc::clone(&total),
        });

        for _ in 0..5 {
            actor_ref.tell(1).unwrap();
        }
        assert!(system.await_quiescence(Duration::from_secs(10)));
        assert_eq!(total.load(Ordering::SeqCst), 5);
        assert_eq!(system.dispatcher().name(), "thread");
    }

    #[test]
    fn test_from_config_tokio_requires_runtime() {
        let err = ActorSystem::from_config(&RuntimeConfig::default()).unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
