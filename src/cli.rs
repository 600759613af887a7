//! Command-Line Interface (CLI) argument parsing.
//!
//! Every argument is optional. The parsed arguments are merged on top of the
//! defaults and the optional configuration file by `Config::load`.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Periodically logs host CPU and memory utilization until interrupted.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds to wait between samples.
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Path of the performance log file.
    #[arg(short, long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Filter for internal diagnostics written to stderr.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Shorten the sleep between samples by the CPU measurement window.
    #[arg(long)]
    pub compensate_drift: bool,

    /// Positional arguments are accepted and ignored.
    #[arg(hide = true, value_name = "IGNORED")]
    pub ignored: Vec<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(interval) = self.interval {
            dict.insert("interval_seconds".into(), Value::from(interval));
        }

        if let Some(path) = &self.log_file {
            dict.insert(
                "log_file".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        // A bare flag can only turn compensation on; leaving it off keeps
        // whatever the file says.
        if self.compensate_drift {
            dict.insert("compensate_measurement_window".into(), Value::from(true));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
