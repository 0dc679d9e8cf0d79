//! Runtime defaults
//!
//! Default values shared by the actor runtime and its services.

/// Mailbox defaults
pub mod mailbox {
    /// Messages each queue (system and user) may hold before senders are rejected
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Messages a single drain pass may process before yielding the dispatcher
    pub const DEFAULT_BATCH_SIZE: usize = 30;

    /// Largest accepted queue capacity; queue slots are allocated up front
    pub const MAX_CAPACITY: usize = 1 << 20;
}

/// Dispatcher defaults
pub mod dispatcher {
    /// Name prefix for threads started by the thread dispatcher
    pub const THREAD_NAME_PREFIX: &str = "actor-drain";
}

/// Logging defaults
pub mod logging {
    /// Filter used when neither the config nor `RUST_LOG` set one
    pub const DEFAULT_LEVEL: &str = "info";
}

/// Environment configuration
pub mod env {
    /// Prefix for environment overrides, e.g. `ACTOR__MAILBOX__CAPACITY=256`
    pub const PREFIX: &str = "ACTOR";

    /// Separator between the prefix and nested keys
    pub const SEPARATOR: &str = "__";

    /// Variable naming the configuration file used by `load_config`
    pub const CONFIG_PATH_VAR: &str = "ACTOR_CONFIG_PATH";
}
