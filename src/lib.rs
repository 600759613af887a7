//! perfwatch - a host performance sampler
//!
//! This library samples system-wide CPU and memory utilization on a fixed
//! interval and appends one human-readable record per sample to a log file
//! and the console, until the process is interrupted.

pub mod cli;
pub mod config;
pub mod core;
pub mod formatting;
pub mod monitor;
pub mod provider;
pub mod sink;

// Re-export core types for convenience
pub use crate::core::*;
pub use monitor::{
    spawn_stop_listener, Monitor, MonitorBuilder, MonitorError, Outcome, RunState,
};
