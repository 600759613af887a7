//! Core domain types and service traits for perfwatch
//!
//! This module defines the readings produced by a metrics provider, the
//! records written to the log sink, and the trait contracts that connect the
//! monitor loop to its collaborators.

use crate::provider::ProviderError;
use crate::sink::SinkError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;

/// Number of bytes in one megabyte, as used for display.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Timestamp layout used by every record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// System-wide CPU utilization measured over a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuUsage {
    /// Utilization percentage (0-100%)
    pub percent: f64,
}

/// System memory utilization at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    /// Percentage of total memory in use (0-100%)
    pub percent: f64,
    /// Bytes in use
    pub used_bytes: u64,
    /// Total installed bytes
    pub total_bytes: u64,
}

impl MemoryUsage {
    /// Builds a reading from raw byte counts, deriving the percentage.
    pub fn from_bytes(used_bytes: u64, total_bytes: u64) -> Self {
        let percent = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / total_bytes as f64 * 100.0
        };
        Self {
            percent,
            used_bytes,
            total_bytes,
        }
    }

    pub fn used_mb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_MB
    }

    pub fn total_mb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_MB
    }
}

/// A CPU reading, or the reason it is unavailable.
pub type CpuReading = Result<CpuUsage, ProviderError>;

/// A memory reading, or the reason it is unavailable.
pub type MemoryReading = Result<MemoryUsage, ProviderError>;

/// Severity attached to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line in the performance log.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl Record {
    /// Creates a record stamped with the current local time.
    pub fn now(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.severity,
            self.message
        )
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Supplies CPU and memory utilization for the host.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Measures system-wide CPU utilization over `window`.
    ///
    /// The call suspends for the whole window; the reading compares CPU
    /// times at its start and end.
    async fn cpu_percent(&self, window: Duration) -> CpuReading;

    /// Returns the current memory utilization. Does not wait.
    async fn memory(&self) -> MemoryReading;
}

/// Accepts finished records and writes them to a destination.
pub trait RecordSink: Send + Sync {
    /// A short name for the destination (e.g., "file", "console").
    /// Used in diagnostics.
    fn name(&self) -> &str;

    /// Whether a failed write to this destination should stop the monitor.
    ///
    /// Defaults to `true`. A destination that only mirrors records for a
    /// person watching, such as the console, returns `false`.
    fn required(&self) -> bool {
        true
    }

    /// Writes one record as a single line.
    ///
    /// # Returns
    /// * `Ok(())` once the line has been handed to the destination
    /// * `Err` if the destination rejected the write
    fn write_record(&self, record: &Record) -> Result<(), SinkError>;
}
