//! perfwatch - Host Performance Sampler
//!
//! Logs system-wide CPU and memory utilization every few seconds until
//! interrupted with Ctrl+C.

use anyhow::Result;
use clap::Parser;
use perfwatch::{cli::Cli, config::Config, spawn_stop_listener, Monitor, RunState};
use std::process::ExitCode;
use tokio::{signal, sync::watch};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, and CLI args.
    let config = Config::load(&cli)?;

    // Diagnostics only; performance records go through the monitor's sink.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    debug!(?config, "Configuration loaded");
    if !cli.ignored.is_empty() {
        debug!(args = ?cli.ignored, "Ignoring positional arguments");
    }

    let monitor = Monitor::builder(config).build()?;

    // =========================================================================
    // Interrupt listener
    // =========================================================================
    let (shutdown_tx, shutdown_rx) = watch::channel(RunState::Running);
    let _listener = spawn_stop_listener(signal::ctrl_c(), shutdown_tx).await;

    let outcome = monitor.run(shutdown_rx).await;
    Ok(ExitCode::from(outcome.exit_code()))
}
