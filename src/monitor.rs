//! The sampling loop.
//!
//! `Monitor::run` announces itself, then repeats `run_tick` and a sleep until
//! the run state flips to `Stopping`. A drop guard created at the top of `run`
//! writes the final "finished" record on every way out of the function.

use crate::{
    config::Config,
    core::{CpuReading, MemoryReading, MetricsProvider, Record, RecordSink, Severity},
    formatting,
    provider::{SysinfoProvider, CPU_MEASUREMENT_WINDOW},
    sink::{LogSink, SinkError},
};
use anyhow::Result;
use std::future::Future;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info_span, instrument, Instrument};

/// Whether the loop should keep sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopping,
}

/// How a call to `Monitor::run` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped on request.
    Stopped,
    /// Ended by an unanticipated error, already logged at critical severity.
    Failed,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Stopped => 0,
            Outcome::Failed => 1,
        }
    }
}

/// Errors that end the loop.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("shutdown channel closed before a stop was requested")]
    ShutdownChannelClosed,
}

/// Writes the "finished" record when dropped.
struct FinishedGuard<'a> {
    sink: &'a dyn RecordSink,
}

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        let record = Record::now(Severity::Info, formatting::FINISHED);
        if let Err(e) = self.sink.write_record(&record) {
            error!("Failed to write final record: {}", e);
        }
    }
}

/// Periodically samples CPU and memory and logs the readings.
pub struct Monitor {
    config: Config,
    provider: Arc<dyn MetricsProvider>,
    sink: Arc<dyn RecordSink>,
    console: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a new `MonitorBuilder` to construct a `Monitor`.
    pub fn builder(config: Config) -> MonitorBuilder {
        MonitorBuilder::new(config)
    }

    /// Runs until the run state becomes `Stopping` or an unanticipated error
    /// occurs.
    ///
    /// Exactly one "finished" record is written per call, whichever way the
    /// call ends.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<RunState>) -> Outcome {
        let _finished = FinishedGuard {
            sink: self.sink.as_ref(),
        };

        match self.run_loop(&mut shutdown_rx).await {
            Ok(()) => {
                if let Err(e) = self.log(Severity::Info, formatting::STOPPED_BY_USER) {
                    error!("Failed to write stop record: {}", e);
                }
                self.print("\nMonitoring stopped.");
                Outcome::Stopped
            }
            Err(e) => {
                let detail = anyhow::Error::new(e);
                if let Err(sink_err) = self.log(
                    Severity::Critical,
                    format!("An unexpected error occurred: {:#}", detail),
                ) {
                    error!("Failed to write critical record: {}", sink_err);
                }
                debug!("Unexpected error detail: {:?}", detail);
                self.print(&format!("An unexpected error occurred: {:#}", detail));
                Outcome::Failed
            }
        }
    }

    async fn run_loop(
        &self,
        shutdown_rx: &mut watch::Receiver<RunState>,
    ) -> Result<(), MonitorError> {
        self.log(
            Severity::Info,
            formatting::started_line(&self.config.log_file, self.config.interval_seconds),
        )?;
        self.print("Monitoring system performance... Press Ctrl+C to stop.");
        self.print(&format!(
            "Logging data to: {}",
            self.config.log_file.display()
        ));

        let pause = self.pause();
        let mut tick: u64 = 0;
        loop {
            if *shutdown_rx.borrow_and_update() == RunState::Stopping {
                debug!(ticks = tick, "Stop requested, leaving loop");
                return Ok(());
            }

            tick += 1;
            let started = Instant::now();
            self.run_tick().instrument(info_span!("tick", tick)).await?;
            debug!(tick, elapsed = ?started.elapsed(), "Tick complete");

            tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    changed.map_err(|_| MonitorError::ShutdownChannelClosed)?;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// The time to sleep after each tick.
    ///
    /// By default this is the full interval, so ticks start roughly
    /// `interval + CPU_MEASUREMENT_WINDOW` apart.
    pub fn pause(&self) -> Duration {
        let interval = self.config.interval();
        if self.config.compensate_measurement_window {
            interval.saturating_sub(CPU_MEASUREMENT_WINDOW)
        } else {
            interval
        }
    }

    /// Samples both metrics once and writes the resulting record.
    ///
    /// A failed query never aborts the tick: it is logged by the query and
    /// summarised here by a single warning. Only a sink failure is returned.
    pub async fn run_tick(&self) -> Result<(), MonitorError> {
        let cpu = self.query_cpu().await?;
        let memory = self.query_memory().await?;

        match (cpu, memory) {
            (Ok(cpu), Ok(memory)) => {
                self.log(Severity::Info, formatting::performance_line(&cpu, &memory))?
            }
            _ => self.log(Severity::Warning, formatting::INCOMPLETE_DATA)?,
        }
        Ok(())
    }

    /// Queries CPU utilization, logging an error record if the provider fails.
    ///
    /// The outer `Result` carries sink failures; the inner one is the reading.
    #[instrument(skip(self))]
    pub async fn query_cpu(&self) -> Result<CpuReading, MonitorError> {
        let reading = self.provider.cpu_percent(CPU_MEASUREMENT_WINDOW).await;
        if let Err(e) = &reading {
            self.log(Severity::Error, format!("Error getting CPU usage: {}", e))?;
        }
        Ok(reading)
    }

    /// Queries memory utilization, logging an error record if the provider fails.
    #[instrument(skip(self))]
    pub async fn query_memory(&self) -> Result<MemoryReading, MonitorError> {
        let reading = self.provider.memory().await;
        if let Err(e) = &reading {
            self.log(Severity::Error, format!("Error getting memory usage: {}", e))?;
        }
        Ok(reading)
    }

    fn log(&self, severity: Severity, message: impl Into<String>) -> Result<(), SinkError> {
        self.sink.write_record(&Record::now(severity, message))
    }

    /// Console announcements are best effort.
    fn print(&self, line: &str) {
        match self.console.lock() {
            Ok(mut console) => {
                if let Err(e) = writeln!(console, "{}", line).and_then(|_| console.flush()) {
                    debug!("Console write failed: {}", e);
                }
            }
            Err(_) => debug!("Console lock poisoned, dropping: {}", line),
        }
    }
}

/// Spawns a task that flips the run state to `Stopping` once `signal`
/// resolves.
///
/// Returns only after the task has been polled once, so a signal handler
/// installed on first poll is in place before the caller announces itself.
/// If `signal` fails the sender is dropped, which the loop treats as an
/// unexpected error.
pub async fn spawn_stop_listener<F>(
    signal: F,
    shutdown_tx: watch::Sender<RunState>,
) -> JoinHandle<()>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                debug!("Interrupt received");
                // The loop may already be gone if it failed.
                let _ = shutdown_tx.send(RunState::Stopping);
            }
            Err(e) => {
                error!("Failed to listen for the interrupt signal: {}", e);
            }
        }
    });
    tokio::task::yield_now().await;
    handle
}

/// Builder for the monitor.
///
/// The defaults are the real collaborators: `SysinfoProvider`, a `LogSink`
/// over the configured file plus stderr, and stdout for announcements. Each
/// can be overridden for testing.
pub struct MonitorBuilder {
    config: Config,
    provider_override: Option<Arc<dyn MetricsProvider>>,
    sink_override: Option<Arc<dyn RecordSink>>,
    console_override: Option<Box<dyn Write + Send>>,
}

impl MonitorBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider_override: None,
            sink_override: None,
            console_override: None,
        }
    }

    /// Overrides the metrics provider.
    pub fn provider_override(mut self, provider: Arc<dyn MetricsProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Overrides the record sink. No log file is opened when set.
    pub fn sink_override(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink_override = Some(sink);
        self
    }

    /// Overrides the console used for announcements.
    pub fn console_override(mut self, console: Box<dyn Write + Send>) -> Self {
        self.console_override = Some(console);
        self
    }

    pub fn build(self) -> Result<Monitor> {
        self.config.validate()?;

        let sink: Arc<dyn RecordSink> = match self.sink_override {
            Some(sink) => sink,
            None => Arc::new(LogSink::file_and_console(&self.config.log_file)?),
        };
        let provider: Arc<dyn MetricsProvider> = self
            .provider_override
            .unwrap_or_else(|| Arc::new(SysinfoProvider::new()));
        let console: Box<dyn Write + Send> = self
            .console_override
            .unwrap_or_else(|| Box::new(io::stdout()));

        Ok(Monitor {
            config: self.config,
            provider,
            sink,
            console: Mutex::new(console),
        })
    }
}
