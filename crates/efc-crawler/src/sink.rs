use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use efc_extract::JobRecord;

use crate::error::{CrawlError, SinkError};

/// Destination of emitted job records.
pub trait RecordSink: Send + Sync {
    fn emit(&self, records: &[JobRecord]) -> Result<(), SinkError>;
}

/// One JSON object per line, flushed after every batch.
pub struct JsonLinesSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn create(path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| CrawlError::Output {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&self, records: &[JobRecord]) -> Result<(), SinkError> {
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(&buffer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<JobRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, records: &[JobRecord]) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .extend_from_slice(records);
        Ok(())
    }
}
