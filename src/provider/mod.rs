//! # Host Metrics Provider
//!
//! `SysinfoProvider` is the production `MetricsProvider`. It keeps one
//! `sysinfo::System` alive for the lifetime of the process and refreshes only
//! the parts it reads. CPU utilization is a difference between two CPU time
//! snapshots, so a CPU query refreshes, waits for the measurement window,
//! then refreshes again.

#[cfg(feature = "test-utils")]
pub mod test_utils;

use crate::core::{CpuReading, CpuUsage, MemoryReading, MemoryUsage, MetricsProvider};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use thiserror::Error;
use tracing::{instrument, trace};

/// Length of the window over which CPU utilization is measured.
pub const CPU_MEASUREMENT_WINDOW: Duration = Duration::from_secs(1);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("system statistics are not supported on this platform")]
    Unsupported,

    #[error("the system reported zero total memory")]
    NoMemory,

    #[error("received a non-finite {0} reading")]
    InvalidReading(&'static str),

    #[error("system information lock was poisoned")]
    Poisoned,

    #[error("{0}")]
    Other(String),
}

/// Reads CPU and memory utilization from the operating system.
pub struct SysinfoProvider {
    system: Mutex<System>,
}

impl std::fmt::Debug for SysinfoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProvider").finish_non_exhaustive()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        Self {
            system: Mutex::new(system),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, System>, ProviderError> {
        self.system.lock().map_err(|_| ProviderError::Poisoned)
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsProvider for SysinfoProvider {
    #[instrument(skip(self))]
    async fn cpu_percent(&self, window: Duration) -> CpuReading {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProviderError::Unsupported);
        }

        // The guard must not be held across the await below.
        self.lock()?.refresh_cpu_usage();

        // Usage is a diff between refreshes; shorter gaps are meaningless.
        tokio::time::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;

        let percent = {
            let mut system = self.lock()?;
            system.refresh_cpu_usage();
            system.global_cpu_info().cpu_usage()
        };
        trace!(percent, "CPU refreshed");

        if !percent.is_finite() {
            return Err(ProviderError::InvalidReading("CPU"));
        }
        Ok(CpuUsage {
            percent: f64::from(percent.clamp(0.0, 100.0)),
        })
    }

    #[instrument(skip(self))]
    async fn memory(&self) -> MemoryReading {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProviderError::Unsupported);
        }

        let (used, total) = {
            let mut system = self.lock()?;
            system.refresh_memory();
            (system.used_memory(), system.total_memory())
        };
        trace!(used, total, "Memory refreshed");

        if total == 0 {
            return Err(ProviderError::NoMemory);
        }
        Ok(MemoryUsage::from_bytes(used.min(total), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_reading_is_consistent() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let provider = SysinfoProvider::new();
        let memory = provider.memory().await.unwrap();

        assert!(memory.total_bytes > 0);
        assert!(memory.used_bytes <= memory.total_bytes);
        assert!((0.0..=100.0).contains(&memory.percent));
    }

    #[tokio::test]
    async fn test_cpu_reading_within_bounds() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let provider = SysinfoProvider::new();
        let cpu = provider
            .cpu_percent(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
            .await
            .unwrap();

        assert!((0.0..=100.0).contains(&cpu.percent));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProviderError::InvalidReading("CPU").to_string(),
            "received a non-finite CPU reading"
        );
        assert_eq!(
            ProviderError::Other("permission denied".to_string()).to_string(),
            "permission denied"
        );
    }
}
