//! Event Logger
//!
//! Writes residency and navigation events as JSON lines, one record per line,
//! and keeps a per-kind tally for the end-of-run summary.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use village_events::EventRecord;

/// Resource: sink for drained tick events
#[derive(Resource)]
pub struct EventLogger {
    /// `None` discards records but still counts them
    sink: Option<BufWriter<File>>,
    tally: BTreeMap<&'static str, u64>,
}

impl EventLogger {
    /// Truncates `path` and logs into it.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            sink: Some(BufWriter::new(file)),
            tally: BTreeMap::new(),
        })
    }

    pub fn null() -> Self {
        Self {
            sink: None,
            tally: BTreeMap::new(),
        }
    }

    pub fn event_count(&self) -> u64 {
        self.tally.values().sum()
    }

    /// Records seen so far, by event kind label.
    pub fn tally(&self) -> &BTreeMap<&'static str, u64> {
        &self.tally
    }

    pub fn log(&mut self, record: &EventRecord) -> std::io::Result<()> {
        *self.tally.entry(record.kind.label()).or_insert(0) += 1;
        match self.sink.as_mut() {
            Some(sink) => writeln!(sink, "{}", record.to_jsonl()?),
            None => Ok(()),
        }
    }

    pub fn log_batch(&mut self, records: &[EventRecord]) -> std::io::Result<()> {
        records.iter().try_for_each(|record| self.log(record))
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush event log: {}", e);
        }
    }
}
