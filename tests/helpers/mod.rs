#![allow(dead_code)]
use perfwatch::{
    config::Config,
    provider::test_utils::FakeProvider,
    sink::test_utils::{MemorySink, SharedBuffer},
    MemoryUsage, Monitor,
};
use std::sync::Arc;

pub const MB: u64 = 1024 * 1024;

/// The reading used by most tests: 63.2% of 8 GiB, 4 GiB of it in use.
pub fn sample_memory() -> MemoryUsage {
    MemoryUsage {
        percent: 63.2,
        used_bytes: 4096 * MB,
        total_bytes: 8192 * MB,
    }
}

pub const SAMPLE_LINE: &str = "CPU Usage: 42.5% | Memory Usage: 63.2% (4096.0MB / 8192.0MB)";

/// A monitor wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub monitor: Monitor,
    pub provider: FakeProvider,
    pub sink: MemorySink,
    pub console: SharedBuffer,
}

impl Harness {
    pub fn new(config: Config, provider: FakeProvider) -> Self {
        let sink = MemorySink::new();
        let console = SharedBuffer::new();
        let monitor = Monitor::builder(config)
            .provider_override(Arc::new(provider.clone()))
            .sink_override(Arc::new(sink.clone()))
            .console_override(Box::new(console.clone()))
            .build()
            .unwrap();
        Self {
            monitor,
            provider,
            sink,
            console,
        }
    }

    pub fn steady() -> Self {
        Self::new(Config::default(), FakeProvider::steady(42.5, sample_memory()))
    }
}
