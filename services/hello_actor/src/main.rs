//! Greeter demonstration entry point
//!
//! Creates one actor, greets it twice, sends it something it does not
//! understand plus one system message, then reports what the cell did.

use actor_config::{DispatcherKind, RuntimeConfig};
use anyhow::{Context, Result};
use cell_actors::{Actor, ActorError, ActorSystem, AnyMessage};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mailbox capacity per queue
    #[arg(long)]
    capacity: Option<usize>,

    /// Messages handled per drain pass
    #[arg(long)]
    batch_size: Option<usize>,

    /// Dispatcher: tokio, tokio-blocking or thread
    #[arg(long)]
    dispatcher: Option<String>,

    /// How long to wait for the actor to go idle, in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

#[derive(Debug, Clone)]
struct Hello {
    name: String,
}

#[derive(Debug, Clone, Copy)]
enum Lifecycle {
    Ping,
}

struct Greeter {
    greeted: usize,
}

impl Actor for Greeter {
    type Message = AnyMessage;

    fn receive(&mut self, msg: AnyMessage) -> cell_actors::Result<()> {
        let hello = msg
            .downcast::<Hello>()
            .map_err(|other| ActorError::unrecognized(other.type_name()))?;
        self.greeted += 1;
        info!(greeted = self.greeted, "Hello {}", hello.name);
        Ok(())
    }

    fn receive_system(&mut self, msg: AnyMessage) -> cell_actors::Result<()> {
        match msg.downcast_ref::<Lifecycle>() {
            Some(signal) => {
                info!(?signal, greeted = self.greeted, "System message received");
                Ok(())
            }
            None => Err(ActorError::unrecognized(msg.type_name())),
        }
    }
}

fn load_config(args: &Args) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::load(args.config.as_deref())?;

    if let Some(capacity) = args.capacity {
        config.mailbox.capacity = capacity;
    }
    if let Some(batch_size) = args.batch_size {
        config.mailbox.batch_size = batch_size;
    }
    if let Some(kind) = &args.dispatcher {
        config.dispatcher.kind = kind.parse::<DispatcherKind>()?;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hello-actor");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        dispatcher = %config.dispatcher.kind,
        capacity = config.mailbox.capacity,
        batch_size = config.mailbox.batch_size,
        "Configuration loaded"
    );

    let system = ActorSystem::from_config(&config).context("Failed to build actor system")?;
    let greeter = system.actor_of(Greeter { greeted: 0 });

    let messages = [
        AnyMessage::new(Hello {
            name: "Roger".to_string(),
        }),
        AnyMessage::new(Hello {
            name: "Go".to_string(),
        }),
        AnyMessage::new(100_i32),
    ];
    for msg in messages {
        if let Err(e) = greeter.tell(msg) {
            warn!(error = %e, "Tell rejected");
        }
    }
    if let Err(e) = greeter.send_system_message(AnyMessage::new(Lifecycle::Ping)) {
        warn!(error = %e, "System message rejected");
    }

    let waiter = system.clone();
    let timeout = Duration::from_millis(args.timeout_ms);
    let idle = tokio::task::spawn_blocking(move || waiter.await_quiescence(timeout)).await?;
    if !idle {
        warn!(timeout_ms = args.timeout_ms, "Actor still busy at timeout");
    }

    let stats = greeter.stats();
    info!(
        actor_id = %greeter.id(),
        delivered = stats.delivered(),
        unrecognized = stats.unrecognized_messages,
        drain_passes = stats.drain_passes,
        rearms = stats.rearms,
        largest_pass = stats.largest_pass,
        avg_processing_ns = stats.avg_processing_time_ns,
        "Greeter finished"
    );

    Ok(())
}
