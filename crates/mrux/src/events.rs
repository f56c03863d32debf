//! Records produced by the MRU plugins and the sinks that receive them.

use crate::error::{MruError, MruResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// One entry of an MRU list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MruRecord {
    /// Path of the key holding the list.
    pub key_path: String,
    /// 1-based position in the list (1 = most recent).
    pub ordinal: usize,
    /// Entry number; also the name of the value holding the entry's data.
    pub entry: u32,
    /// Display text resolved from the entry's value. Empty when unresolvable.
    pub text: String,
    /// Key last-written time. Only the first record of a list carries it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Provenance tag of the producing plugin.
    pub source: &'static str,
}

impl MruRecord {
    /// Human-readable label, e.g. `MRUListEx Entry 3 (nr. 1)`.
    pub fn label(&self) -> String {
        format!("MRUListEx Entry {} (nr. {})", self.entry, self.ordinal)
    }

    /// Convert into the shape accepted by an [`EventSink`].
    pub fn into_event(self) -> RegistryEvent {
        let mut regvalue = BTreeMap::new();
        regvalue.insert(self.label(), self.text);
        RegistryEvent {
            key_path: self.key_path,
            regvalue,
            timestamp: self.timestamp,
            source_append: format!(": {}", self.source),
        }
    }
}

/// A registry event as handed to the output layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEvent {
    pub key_path: String,
    /// Label → text. MRU events carry exactly one entry.
    pub regvalue: BTreeMap<String, String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub source_append: String,
}

/// Destination for emitted events.
pub trait EventSink {
    fn emit(&mut self, event: RegistryEvent) -> MruResult<()>;
}

impl EventSink for Vec<RegistryEvent> {
    fn emit(&mut self, event: RegistryEvent) -> MruResult<()> {
        self.push(event);
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer, written: 0 }
    }

    /// Number of events written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> MruResult<()> {
        self.writer
            .flush()
            .map_err(|e| MruError::Sink(e.to_string()))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: RegistryEvent) -> MruResult<()> {
        serde_json::to_writer(&mut self.writer, &event)
            .map_err(|e| MruError::Sink(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| MruError::Sink(e.to_string()))?;
        self.written += 1;
        Ok(())
    }
}
