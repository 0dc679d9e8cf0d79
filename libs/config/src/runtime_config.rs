//! Runtime Configuration Module
//!
//! Provides configuration loading for the actor runtime. Supports loading
//! from TOML files with environment variable overrides.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main runtime configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Mailbox bounds applied to every actor unless overridden
    pub mailbox: MailboxSettings,

    /// Which executor runs drain passes
    pub dispatcher: DispatcherSettings,

    /// Logging settings for binaries embedding the runtime
    pub logging: LoggingSettings,
}

/// Per-actor mailbox tunables
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MailboxSettings {
    /// Capacity of each queue (system and user)
    pub capacity: usize,

    /// Upper bound on messages handled by one drain pass
    pub batch_size: usize,
}

/// Dispatcher selection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DispatcherSettings {
    pub kind: DispatcherKind,
    pub thread_name_prefix: String,
}

/// Executor backing the dispatcher
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DispatcherKind {
    /// Spawn each pass as a task on the current tokio runtime
    #[default]
    Tokio,
    /// Run each pass on tokio's blocking pool
    TokioBlocking,
    /// Run each pass on a short-lived OS thread
    Thread,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            capacity: defaults::mailbox::DEFAULT_CAPACITY,
            batch_size: defaults::mailbox::DEFAULT_BATCH_SIZE,
        }
    }
}

impl MailboxSettings {
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            capacity,
            batch_size,
        }
    }

    /// Reject bounds that would make a mailbox unusable
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            bail!("mailbox.capacity must be at least 1");
        }
        if self.capacity > defaults::mailbox::MAX_CAPACITY {
            bail!(
                "mailbox.capacity {} exceeds the maximum of {}",
                self.capacity,
                defaults::mailbox::MAX_CAPACITY
            );
        }
        if self.batch_size == 0 {
            bail!("mailbox.batch_size must be at least 1");
        }
        Ok(())
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            kind: DispatcherKind::default(),
            thread_name_prefix: defaults::dispatcher::THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

impl fmt::Display for DispatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherKind::Tokio => write!(f, "tokio"),
            DispatcherKind::TokioBlocking => write!(f, "tokio-blocking"),
            DispatcherKind::Thread => write!(f, "thread"),
        }
    }
}

impl std::str::FromStr for DispatcherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tokio" => Ok(DispatcherKind::Tokio),
            "tokio-blocking" => Ok(DispatcherKind::TokioBlocking),
            "thread" => Ok(DispatcherKind::Thread),
            other => bail!("unknown dispatcher kind '{}'", other),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading runtime config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (ACTOR__ prefix)
        builder = builder.add_source(
            Environment::with_prefix(defaults::env::PREFIX)
                .prefix_separator(defaults::env::SEPARATOR)
                .separator(defaults::env::SEPARATOR)
                .try_parsing(true),
        );

        let config: RuntimeConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "Runtime configuration loaded");
        Ok(config)
    }

    /// Parse an inline TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RuntimeConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.mailbox.validate().context("Invalid mailbox settings")
    }
}

/// Convenience function to load configuration from `ACTOR_CONFIG_PATH` if set
pub fn load_config() -> Result<RuntimeConfig> {
    let path = std::env::var_os(defaults::env::CONFIG_PATH_VAR).map(PathBuf::from);
    RuntimeConfig::load(path.as_deref())
}
