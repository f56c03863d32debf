//! Owned registry keys loaded from JSON exports.
//!
//! Export format (one object per key, or an array of them):
//!
//! ```text
//! {
//!   "path": "HKCU\\Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\RecentDocs",
//!   "timestamp": "2012-03-04T05:06:07Z",        // or a FILETIME integer
//!   "values": [
//!     { "name": "MRUListEx", "type": "BINARY", "data": "03000000ffffffff" },
//!     { "name": "3",         "type": "SZ",     "data": "fileA.txt" },
//!     { "name": "Count",     "type": "DWORD",  "data": 7 }
//!   ]
//! }
//! ```
//!
//! `SZ`/`EXPAND_SZ` data is text. Everything else is a hex string; `DWORD`
//! and `QWORD` also accept a JSON number.

use crate::error::{RegKeyError, RegKeyResult};
use crate::key::RegistryKey;
use crate::types::{filetime_to_datetime, reg_types, type_from_tag, RegistryValue, ValueData};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// An in-memory copy of one registry key.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawKey")]
pub struct KeySnapshot {
    path: String,
    timestamp: DateTime<Utc>,
    values: Vec<RegistryValue>,
}

impl KeySnapshot {
    pub fn new(path: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        KeySnapshot {
            path: path.into(),
            timestamp,
            values: Vec::new(),
        }
    }

    /// Add a value, replacing any existing value with the same name.
    pub fn with_value(mut self, value: RegistryValue) -> Self {
        self.insert(value);
        self
    }

    /// Insert a value, replacing any existing value with the same name.
    pub fn insert(&mut self, value: RegistryValue) {
        match self
            .values
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(&value.name))
        {
            Some(existing) => *existing = value,
            None => self.values.push(value),
        }
    }

    /// All values in stored order.
    pub fn values(&self) -> &[RegistryValue] {
        &self.values
    }
}

impl RegistryKey for KeySnapshot {
    fn path(&self) -> &str {
        &self.path
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn value(&self, name: &str) -> Option<RegistryValue> {
        self.values
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn value_names(&self) -> Vec<String> {
        self.values.iter().map(|v| v.name.clone()).collect()
    }

    fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name.eq_ignore_ascii_case(name))
    }
}

// ── JSON loading ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawKey {
    path: String,
    timestamp: serde_json::Value,
    #[serde(default)]
    values: Vec<RawValue>,
}

#[derive(Deserialize)]
struct RawValue {
    name: String,
    #[serde(rename = "type")]
    value_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Either a single key object or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Many(Vec<KeySnapshot>),
    One(KeySnapshot),
}

impl TryFrom<RawKey> for KeySnapshot {
    type Error = RegKeyError;

    fn try_from(raw: RawKey) -> RegKeyResult<Self> {
        let timestamp = parse_timestamp(&raw.path, &raw.timestamp)?;
        let mut key = KeySnapshot::new(raw.path, timestamp);
        for value in raw.values {
            key.insert(parse_value(value)?);
        }
        Ok(key)
    }
}

/// Accept RFC 3339 text, a FILETIME integer, or a decimal FILETIME string.
fn parse_timestamp(path: &str, val: &serde_json::Value) -> RegKeyResult<DateTime<Utc>> {
    let invalid = |msg: String| RegKeyError::InvalidTimestamp {
        path: path.to_string(),
        msg,
    };
    match val {
        serde_json::Value::Number(n) => {
            let ft = n
                .as_u64()
                .ok_or_else(|| invalid(format!("expected unsigned FILETIME, got {}", n)))?;
            filetime_to_datetime(ft).ok_or_else(|| invalid(format!("FILETIME {} out of range", ft)))
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Ok(ft) = s.parse::<u64>() {
                return filetime_to_datetime(ft)
                    .ok_or_else(|| invalid(format!("FILETIME {} out of range", ft)));
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid(e.to_string()))
        }
        other => Err(invalid(format!("expected string or number, got {}", other))),
    }
}

fn parse_value(raw: RawValue) -> RegKeyResult<RegistryValue> {
    let invalid = |msg: String| RegKeyError::InvalidValue {
        name: raw.name.clone(),
        msg,
    };
    let value_type = type_from_tag(&raw.value_type)
        .ok_or_else(|| invalid(format!("unknown value type '{}'", raw.value_type)))?;

    let data = match value_type {
        reg_types::REG_SZ | reg_types::REG_EXPAND_SZ => {
            let text = match &raw.data {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => return Err(invalid(format!("expected string data, got {}", other))),
            };
            if value_type == reg_types::REG_SZ {
                ValueData::String(text)
            } else {
                ValueData::ExpandString(text)
            }
        }
        reg_types::REG_DWORD | reg_types::REG_QWORD
            if matches!(raw.data, serde_json::Value::Number(_)) =>
        {
            let n = raw
                .data
                .as_u64()
                .ok_or_else(|| invalid("expected unsigned integer".to_string()))?;
            let raw_bytes = if value_type == reg_types::REG_DWORD {
                let n = u32::try_from(n)
                    .map_err(|_| invalid(format!("{} does not fit in a DWORD", n)))?;
                n.to_le_bytes().to_vec()
            } else {
                n.to_le_bytes().to_vec()
            };
            ValueData::Other {
                value_type,
                raw: raw_bytes,
            }
        }
        _ => {
            let bytes = match &raw.data {
                serde_json::Value::String(s) => parse_hex(s)?,
                serde_json::Value::Null => Vec::new(),
                other => return Err(invalid(format!("expected hex string, got {}", other))),
            };
            if value_type == reg_types::REG_BINARY {
                ValueData::Binary(bytes)
            } else {
                ValueData::Other {
                    value_type,
                    raw: bytes,
                }
            }
        }
    };
    Ok(RegistryValue::new(raw.name, data))
}

/// Parse a hex string. Whitespace and an optional `0x` prefix are ignored.
fn parse_hex(s: &str) -> RegKeyResult<Vec<u8>> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let hex_clean: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&hex_clean).map_err(|e| RegKeyError::InvalidHex(e.to_string()))
}

/// Parse keys from JSON text (an array of key objects, or a single one).
pub fn parse_snapshots(json: &str) -> RegKeyResult<Vec<KeySnapshot>> {
    let doc: RawDocument =
        serde_json::from_str(json).map_err(|e| RegKeyError::JsonParse(e.to_string()))?;
    Ok(match doc {
        RawDocument::Many(keys) => keys,
        RawDocument::One(key) => vec![key],
    })
}

/// Load keys from a JSON export on disk.
pub fn load_snapshots(path: impl AsRef<Path>) -> RegKeyResult<Vec<KeySnapshot>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RegKeyError::FileNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| RegKeyError::Io(format!("{}: {}", path.display(), e)))?;
    let keys = parse_snapshots(&text)?;
    debug!("regkey: loaded {} keys from {}", keys.len(), path.display());
    Ok(keys)
}
