//! Message text for the records the monitor writes.

use crate::core::{CpuUsage, MemoryUsage};
use std::path::Path;

pub const INCOMPLETE_DATA: &str = "Could not retrieve complete performance data in this interval.";
pub const STOPPED_BY_USER: &str = "System Performance Monitor stopped by user.";
pub const FINISHED: &str = "System Performance Monitor finished.";

/// Formats a successful tick.
///
/// Percentages are rounded to one decimal place, megabyte figures to two.
pub fn performance_line(cpu: &CpuUsage, memory: &MemoryUsage) -> String {
    format!(
        "CPU Usage: {}% | Memory Usage: {}% ({}MB / {}MB)",
        decimal(cpu.percent, 1),
        decimal(memory.percent, 1),
        decimal(memory.used_mb(), 2),
        decimal(memory.total_mb(), 2),
    )
}

pub fn started_line(log_file: &Path, interval_seconds: u64) -> String {
    format!(
        "System Performance Monitor started. Logging to {} every {} seconds.",
        log_file.display(),
        interval_seconds
    )
}

/// Rounds `value` to `places` decimals and renders it without trailing
/// zeros, keeping at least one fractional digit.
pub fn decimal(value: f64, places: i32) -> String {
    let scale = 10f64.powi(places);
    let rounded = (value * scale).round() / scale;
    // `-0.0` would otherwise render with a sign.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        rounded.to_string()
    }
}
