use crate::{
    core::{Record, RecordSink, Severity},
    sink::SinkError,
};
use std::io::{self, Write};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// A sink that keeps every record in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// `(severity, message)` pairs, without timestamps.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.severity, r.message.clone()))
            .collect()
    }

    pub fn count(&self, severity: Severity, message: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.severity == severity && r.message == message)
            .count()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_record(&self, record: &Record) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A sink that accepts a fixed number of records and then fails every write.
///
/// Accepted records are forwarded to an inner `MemorySink` so tests can still
/// inspect them.
#[derive(Clone)]
pub struct FailingSink {
    inner: MemorySink,
    remaining: Arc<AtomicUsize>,
    attempts: Arc<Mutex<Vec<Record>>>,
}

impl FailingSink {
    pub fn after(successful_writes: usize) -> Self {
        Self {
            inner: MemorySink::new(),
            remaining: Arc::new(AtomicUsize::new(successful_writes)),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Records that were written successfully.
    pub fn accepted(&self) -> MemorySink {
        self.inner.clone()
    }

    /// Every record offered to the sink, including rejected ones.
    pub fn attempts(&self) -> Vec<Record> {
        self.attempts.lock().unwrap().clone()
    }
}

impl RecordSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn write_record(&self, record: &Record) -> Result<(), SinkError> {
        self.attempts.lock().unwrap().push(record.clone());
        let accepted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if accepted {
            self.inner.write_record(record)
        } else {
            Err(SinkError::Write {
                sink: self.name().to_string(),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            })
        }
    }
}

/// A cloneable in-memory writer, used to capture console output.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
