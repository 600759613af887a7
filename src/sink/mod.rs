//! Record destinations and the fan-out sink.
//!
//! Every record goes to two places: an append-only log file and the console.
//! `LogSink` owns both and writes each record to each of them, so the file and
//! the console always carry the same lines.

#[cfg(feature = "test-utils")]
pub mod test_utils;

use crate::core::{Record, RecordSink};
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to open log file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to {sink} sink")]
    Write {
        sink: String,
        #[source]
        source: io::Error,
    },

    #[error("{0} sink lock was poisoned")]
    Poisoned(String),
}

/// Appends records to a file, one line each.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl FileSink {
    /// Opens `path` for appending, creating it if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Opened log file");
        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write_record(&self, record: &Record) -> Result<(), SinkError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Poisoned(self.name().to_string()))?;
        writeln!(writer, "{}", record).map_err(|source| SinkError::Write {
            sink: self.name().to_string(),
            source,
        })
    }
}

/// Writes records to an interactive stream, stderr by default.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}

impl ConsoleSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl RecordSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn required(&self) -> bool {
        false
    }

    fn write_record(&self, record: &Record) -> Result<(), SinkError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Poisoned(self.name().to_string()))?;
        writeln!(writer, "{}", record)
            .and_then(|_| writer.flush())
            .map_err(|source| SinkError::Write {
                sink: self.name().to_string(),
                source,
            })
    }
}

/// Duplicates every record to a set of destinations.
pub struct LogSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("LogSink").field("sinks", &names).finish()
    }
}

impl LogSink {
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self { sinks }
    }

    /// The standard pair: the log file at `path` plus stderr.
    pub fn file_and_console(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self::new(vec![
            Box::new(FileSink::open(path)?) as Box<dyn RecordSink>,
            Box::new(ConsoleSink::stderr()),
        ]))
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    /// Writes to every destination, even after one fails.
    ///
    /// Returns the first error from a required destination. Failures of
    /// optional destinations are only reported as diagnostics.
    fn write_record(&self, record: &Record) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            match sink.write_record(record) {
                Ok(()) => {}
                Err(e) if sink.required() => {
                    warn!(sink = sink.name(), error = ?e, "Record write failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    warn!(sink = sink.name(), error = ?e, "Record write failed, continuing");
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
