//! LinkKeeper CLI - save, tag and share links from the terminal.
//!
//! Every command restores the session from the stored credential first.
//! Expired credentials are refreshed transparently by the core client;
//! when that fails the user is asked to log in again.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use linkkeeper_core::{Config, Session, SessionClient};

use commands::Cli;

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes buffered log lines when dropped.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();
    info!("LinkKeeper CLI starting");

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config ({}), using defaults", e);
        Config::default()
    });
    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }

    let store = config.token_store()?;
    let client = Arc::new(SessionClient::new(&config, store)?);
    let session = Session::new(client);
    let monitor = session.monitor();

    let result = commands::run(cli.command, &session, &mut config).await;

    monitor.abort();
    result
}
