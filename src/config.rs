//! Configuration management for perfwatch
//!
//! This module defines the `Config` struct holding every runtime setting. It
//! uses the `figment` crate to layer built-in defaults, an optional TOML file,
//! and command-line overrides. With no file and no flags the defaults are
//! used unchanged.

use crate::cli::Cli;
use anyhow::{bail, ensure, Result};
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_FILE: &str = "system_performance.log";
pub const DEFAULT_INTERVAL_SECONDS: u64 = 5;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path of the append-only performance log.
    pub log_file: PathBuf,
    /// Seconds to sleep between ticks.
    pub interval_seconds: u64,
    /// Filter directive for internal diagnostics (e.g. "warn", "perfwatch=debug").
    pub log_level: String,
    /// Subtract the CPU measurement window from the sleep between ticks.
    pub compensate_measurement_window: bool,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// # Arguments
    /// * `cli` - Parsed command-line arguments. `cli.config` names an optional
    ///   TOML file; the remaining fields override individual keys.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("Configuration file not found at {:?}", path);
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment.merge(cli.clone()).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.interval_seconds >= 1,
            "interval_seconds must be at least 1, got {}",
            self.interval_seconds
        );
        ensure!(
            !self.log_file.as_os_str().is_empty(),
            "log_file must not be empty"
        );
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            log_level: "warn".to_string(),
            compensate_measurement_window: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let config = Config::load(&Cli::default()).unwrap();

        assert_eq!(config.log_file, PathBuf::from("system_performance.log"));
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert!(!config.compensate_measurement_window);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = Config {
            interval_seconds: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
