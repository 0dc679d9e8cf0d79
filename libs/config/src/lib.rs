//! # Actor Runtime Configuration
//!
//! Centralized defaults and configuration loading for the cell actor
//! runtime, so the tunables that bound a mailbox live in one place.
//!
//! ## Features
//!
//! - **Defaults**: mailbox capacity, drain batch size, dispatcher naming
//! - **Runtime Configuration**: TOML file plus `ACTOR__` environment overrides
//!
//! ## Usage
//!
//! ```rust
//! use actor_config::{defaults, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_toml_str(
//!     r#"
//! [mailbox]
//! capacity = 64
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.mailbox.capacity, 64);
//! assert_eq!(config.mailbox.batch_size, defaults::mailbox::DEFAULT_BATCH_SIZE);
//! ```

pub mod defaults;
pub mod runtime_config;

// Re-export commonly used types
pub use runtime_config::{
    load_config, DispatcherKind, DispatcherSettings, LoggingSettings, MailboxSettings,
    RuntimeConfig,
};
