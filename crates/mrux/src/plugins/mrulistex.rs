//! MRUListEx plugin — extract most-recently-used lists ordered by `MRUListEx`.
//!
//! Key layout:
//! ```text
//! MRUListEx  REG_BINARY  u32 entry numbers, little-endian, most recent first,
//!                        terminated by 0xFFFFFFFF
//! "3"        REG_SZ / REG_EXPAND_SZ / REG_BINARY   data for entry 3
//! "1"        ...                                   data for entry 1
//! ```
//!
//! The list order is the recency order. The key's last-written time belongs
//! to the most recent entry only, so just the first record carries it.

use super::{ParseObserver, PluginEntry, RecordIter};
use crate::error::{MruError, MruResult};
use crate::events::MruRecord;
use crate::rules::path_exclusions;
use chrono::{DateTime, Utc};
use regkey::{decode_utf16le_lossy, RegistryKey, ValueData};
use tracing::debug;

// ── Constants ────────────────────────────────────────────────────────

/// Name of the value holding the index list.
pub const INDEX_VALUE: &str = "MRUListEx";
/// Value names whose presence routes a key to this plugin.
pub const TRIGGER_VALUES: &[&str] = &["MRUListEx", "0"];
/// Terminates the index list.
pub const SENTINEL: u32 = 0xFFFF_FFFF;
/// Maximum number of entries before the terminator.
pub const MAX_ENTRIES: usize = 500;
/// Provenance tag attached to every record.
pub const SOURCE_TAG: &str = "MRUx List";

/// Plugin table entry.
pub const ENTRY: PluginEntry = PluginEntry {
    name: "mrulistex",
    description: "MRU lists ordered by an MRUListEx index",
    triggers: TRIGGER_VALUES,
    filter: accepts_path,
    process,
};

// ── Index list ───────────────────────────────────────────────────────

/// Decoded `MRUListEx` index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexList {
    entries: Vec<u32>,
    terminated: bool,
}

impl IndexList {
    /// Entry numbers before the terminator, most recent first.
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the list ended with [`SENTINEL`] rather than the end of data.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl IntoIterator for IndexList {
    type Item = u32;
    type IntoIter = std::vec::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Decode an `MRUListEx` buffer.
///
/// The buffer must hold at least one whole u32. Words after the first
/// [`SENTINEL`] are not inspected. More than [`MAX_ENTRIES`] entries before a
/// terminator is an error, not a truncation.
pub fn decode_index_list(raw: &[u8]) -> MruResult<IndexList> {
    if raw.is_empty() {
        return Err(MruError::EmptyIndex);
    }
    if raw.len() % 4 != 0 {
        return Err(MruError::Misaligned { len: raw.len() });
    }

    let mut entries = Vec::with_capacity(std::cmp::min(raw.len() / 4, MAX_ENTRIES));
    for word in raw.chunks_exact(4) {
        let entry = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        if entry == SENTINEL {
            return Ok(IndexList {
                entries,
                terminated: true,
            });
        }
        if entries.len() == MAX_ENTRIES {
            return Err(MruError::TooManyEntries { max: MAX_ENTRIES });
        }
        entries.push(entry);
    }

    Ok(IndexList {
        entries,
        terminated: false,
    })
}

// ── Entry labels ─────────────────────────────────────────────────────

/// Display text for an entry, read from the value named after it.
///
/// Strings are returned as stored. Binary data is read as UTF-16LE, invalid
/// code units dropped, cut at the first NUL. Missing values and other types
/// give an empty string.
pub fn resolve_label(key: &dyn RegistryKey, entry: u32) -> String {
    let Some(value) = key.value(&entry.to_string()) else {
        return String::new();
    };
    match value.data {
        ValueData::String(text) | ValueData::ExpandString(text) => text,
        ValueData::Binary(raw) => {
            let mut text = decode_utf16le_lossy(&raw);
            if let Some(nul) = text.find('\0') {
                text.truncate(nul);
            }
            text
        }
        ValueData::Other { .. } => String::new(),
    }
}

// ── Enumeration ──────────────────────────────────────────────────────

/// Lazy sequence of records for one key.
///
/// Each call to `next` resolves exactly one entry label.
pub struct MruListExIter<'k> {
    key: &'k dyn RegistryKey,
    entries: std::iter::Enumerate<std::vec::IntoIter<u32>>,
    timestamp: Option<DateTime<Utc>>,
}

impl<'k> MruListExIter<'k> {
    fn new(key: &'k dyn RegistryKey, list: IndexList) -> Self {
        MruListExIter {
            key,
            entries: list.into_iter().enumerate(),
            timestamp: Some(key.timestamp()),
        }
    }

    fn empty(key: &'k dyn RegistryKey) -> Self {
        MruListExIter {
            key,
            entries: Vec::new().into_iter().enumerate(),
            timestamp: None,
        }
    }
}

impl Iterator for MruListExIter<'_> {
    type Item = MruRecord;

    fn next(&mut self) -> Option<MruRecord> {
        let (idx, entry) = self.entries.next()?;
        let text = resolve_label(self.key, entry);
        Some(MruRecord {
            key_path: self.key.path().to_string(),
            ordinal: idx + 1,
            entry,
            text,
            timestamp: self.timestamp.take(),
            source: SOURCE_TAG,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for MruListExIter<'_> {}

/// Enumerate a key's MRU list, logging malformed indexes through `tracing`.
pub fn enumerate(key: &dyn RegistryKey) -> MruListExIter<'_> {
    enumerate_with(key, &super::TracingObserver)
}

/// Enumerate a key's MRU list.
///
/// A missing or empty `MRUListEx` value yields nothing. A malformed one is
/// reported to `observer` and yields nothing.
pub fn enumerate_with<'k>(
    key: &'k dyn RegistryKey,
    observer: &dyn ParseObserver,
) -> MruListExIter<'k> {
    let Some(index) = key.value(INDEX_VALUE) else {
        debug!("mrulistex: no {} value in {}", INDEX_VALUE, key.path());
        return MruListExIter::empty(key);
    };

    let raw = index.raw_data();
    if raw.is_empty() {
        debug!("mrulistex: empty {} value in {}", INDEX_VALUE, key.path());
        return MruListExIter::empty(key);
    }

    match decode_index_list(&raw) {
        Ok(list) => {
            debug!(
                "mrulistex: {} entries in {} (terminated={})",
                list.len(),
                key.path(),
                list.is_terminated()
            );
            MruListExIter::new(key, list)
        }
        Err(e) => {
            observer.malformed_index(key.path(), &e);
            MruListExIter::empty(key)
        }
    }
}

// ── Selection ────────────────────────────────────────────────────────

/// Path filter: rejects layouts handled by other plugins.
pub fn accepts_path(path: &str) -> bool {
    match path_exclusions::find_exclusion(path) {
        Some(ex) => {
            debug!("mrulistex: skipping {} ({})", path, ex.description);
            false
        }
        None => true,
    }
}

/// Whether this plugin should run on `key`.
pub fn applies(key: &dyn RegistryKey) -> bool {
    accepts_path(key.path()) && TRIGGER_VALUES.iter().any(|name| key.has_value(name))
}

fn process<'k>(key: &'k dyn RegistryKey, observer: &'k dyn ParseObserver) -> RecordIter<'k> {
    Box::new(enumerate_with(key, observer))
}

// ── Tests ────────────────────────────────────────────────────────────
