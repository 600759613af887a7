use crate::{
    core::{CpuReading, CpuUsage, MemoryReading, MemoryUsage, MetricsProvider},
    provider::ProviderError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Script {
    cpu: VecDeque<CpuReading>,
    memory: VecDeque<MemoryReading>,
    cpu_fallback: Option<CpuReading>,
    memory_fallback: Option<MemoryReading>,
    cpu_calls: u32,
    memory_calls: u32,
    windows: Vec<Duration>,
}

/// Fake metrics provider for testing
///
/// Queued responses are returned first, front to back. Once a queue is empty
/// the fallback response (if any) is repeated.
#[derive(Clone, Default)]
pub struct FakeProvider {
    script: Arc<Mutex<Script>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that returns the same readings on every call.
    pub fn steady(cpu_percent: f64, memory: MemoryUsage) -> Self {
        let provider = Self::new();
        {
            let mut script = provider.script.lock().unwrap();
            script.cpu_fallback = Some(Ok(CpuUsage {
                percent: cpu_percent,
            }));
            script.memory_fallback = Some(Ok(memory));
        }
        provider
    }

    pub fn push_cpu(&self, reading: CpuReading) {
        self.script.lock().unwrap().cpu.push_back(reading);
    }

    pub fn push_memory(&self, reading: MemoryReading) {
        self.script.lock().unwrap().memory.push_back(reading);
    }

    /// Add a CPU error response to the queue
    pub fn push_cpu_error(&self, error: &str) {
        self.push_cpu(Err(ProviderError::Other(error.to_string())));
    }

    /// Add a memory error response to the queue
    pub fn push_memory_error(&self, error: &str) {
        self.push_memory(Err(ProviderError::Other(error.to_string())));
    }

    pub fn cpu_calls(&self) -> u32 {
        self.script.lock().unwrap().cpu_calls
    }

    pub fn memory_calls(&self) -> u32 {
        self.script.lock().unwrap().memory_calls
    }

    /// The measurement windows requested so far, in call order.
    pub fn windows(&self) -> Vec<Duration> {
        self.script.lock().unwrap().windows.clone()
    }
}

#[async_trait]
impl MetricsProvider for FakeProvider {
    async fn cpu_percent(&self, window: Duration) -> CpuReading {
        {
            let mut script = self.script.lock().unwrap();
            script.cpu_calls += 1;
            script.windows.push(window);
        }

        // Behave like a real measurement so timing tests see the window.
        tokio::time::sleep(window).await;

        let mut script = self.script.lock().unwrap();
        match script.cpu.pop_front() {
            Some(reading) => reading,
            None => script.cpu_fallback.clone().unwrap_or_else(|| {
                Err(ProviderError::Other(
                    "no more CPU responses configured".to_string(),
                ))
            }),
        }
    }

    async fn memory(&self) -> MemoryReading {
        let mut script = self.script.lock().unwrap();
        script.memory_calls += 1;
        match script.memory.pop_front() {
            Some(reading) => reading,
            None => script.memory_fallback.clone().unwrap_or_else(|| {
                Err(ProviderError::Other(
                    "no more memory responses configured".to_string(),
                ))
            }),
        }
    }
}
