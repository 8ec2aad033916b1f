//! Output sinks for simulated events

pub mod csv;

pub use csv::CsvEventWriter;

use crate::error::Result;
use crate::sims::EventRecord;

/// Destination for event records produced by a run.
pub trait EventSink {
    fn write_record(&mut self, record: &EventRecord) -> Result<()>;

    /// Flush whatever is buffered. Called once after the last record.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<EventRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventSink for MemorySink {
    fn write_record(&mut self, record: &EventRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
