//! Chat-event detection bot.
//!
//! Joins a chat channel anonymously, classifies incoming lines against the
//! configured event templates, and emits notifications on stdout for the
//! supervising process.

mod loader;
mod publisher;
mod shutdown;

use chatsentry_core::config::EventDefaults;
use chatsentry_core::publish::NotificationPublisher;
use chatsentry_core::session::ChatSession;
use clap::Parser;
use loader::ConfigLoader;
use publisher::StdoutPublisher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Chat-event detection module
#[derive(Parser, Debug)]
#[command(name = "chatsentry-bot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Chat channel to join
    #[arg(long)]
    channel: String,

    /// Source account whose messages are classified as events
    #[arg(long)]
    bot_name: String,

    /// Serialized configuration JSON; takes precedence over the config file
    #[arg(long)]
    patterns: Option<String>,

    /// Path to the JSON settings file
    #[arg(long, default_value = "chatsentry-config.json")]
    config: PathBuf,

    /// API key for the downstream verification mechanism. Passed through
    /// opaquely; never interpreted here.
    #[arg(long)]
    verify_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    tracing::info!("Starting chatsentry-bot v{}", env!("CARGO_PKG_VERSION"));

    let loader = ConfigLoader::new(&args.config, EventDefaults::canonical());
    let mut config = match &args.patterns {
        Some(json) => loader.from_json(json).map_err(|e| {
            tracing::error!("Invalid --patterns configuration: {}", e);
            e
        })?,
        None => loader.load_or_create(),
    };
    config.channel = args.channel;
    config.bot_name = args.bot_name;
    config.validate()?;

    if args.verify_api_key.is_some() {
        tracing::debug!("verification API key supplied; forwarding unused");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let publisher = Arc::new(StdoutPublisher::new());
    let session = ChatSession::new(config, publisher.clone(), shutdown_rx);
    let result = session.run().await;

    publisher.close().await;
    tracing::info!("Shutdown complete");
    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr: stdout is reserved for the notification line
/// protocol the supervising process consumes.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
