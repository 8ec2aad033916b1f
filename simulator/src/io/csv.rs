//! CSV export of per-event channel counts.
//!
//! One header line `event,theta,signal_x,ch_0,...,ch_{N-1}` followed by one
//! row per event. Theta is in radians, signal_x in meters, both written with
//! the shortest representation that parses back to the same value.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::EventSink;
use crate::error::Result;
use crate::sims::EventRecord;

pub struct CsvEventWriter<W: Write = BufWriter<File>> {
    out: W,
    channel_count: usize,
}

impl CsvEventWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the header.
    pub fn create<P: AsRef<Path>>(path: P, channel_count: usize) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), channel_count)
    }
}

impl<W: Write> CsvEventWriter<W> {
    pub fn new(mut out: W, channel_count: usize) -> Result<Self> {
        let mut headers = vec!["event".to_string(), "theta".into(), "signal_x".into()];
        headers.extend((0..channel_count).map(|ch| format!("ch_{ch}")));
        writeln!(out, "{}", headers.join(","))?;
        Ok(Self { out, channel_count })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for CsvEventWriter<W> {
    fn write_record(&mut self, record: &EventRecord) -> Result<()> {
        debug_assert_eq!(record.channel_counts.len(), self.channel_count);
        write!(
            self.out,
            "{},{},{}",
            record.event, record.theta, record.signal_x
        )?;
        for count in &record.channel_counts {
            write!(self.out, ",{count}")?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
