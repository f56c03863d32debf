//! Registry value types.
//!
//! A value's content is resolved once, at construction, into the closed
//! [`ValueData`] variant. Consumers match on it instead of comparing type tag
//! strings.

use chrono::{DateTime, Utc};

/// Registry value type ids.
pub mod reg_types {
    pub const REG_NONE: u32 = 0;
    pub const REG_SZ: u32 = 1;
    pub const REG_EXPAND_SZ: u32 = 2;
    pub const REG_BINARY: u32 = 3;
    pub const REG_DWORD: u32 = 4;
    pub const REG_DWORD_BIG_ENDIAN: u32 = 5;
    pub const REG_LINK: u32 = 6;
    pub const REG_MULTI_SZ: u32 = 7;
    pub const REG_QWORD: u32 = 11;
}

/// Tag string for a registry type id, without the `REG_` prefix.
pub fn type_tag(value_type: u32) -> &'static str {
    match value_type {
        reg_types::REG_NONE => "NONE",
        reg_types::REG_SZ => "SZ",
        reg_types::REG_EXPAND_SZ => "EXPAND_SZ",
        reg_types::REG_BINARY => "BINARY",
        reg_types::REG_DWORD => "DWORD",
        reg_types::REG_DWORD_BIG_ENDIAN => "DWORD_BIG_ENDIAN",
        reg_types::REG_LINK => "LINK",
        reg_types::REG_MULTI_SZ => "MULTI_SZ",
        reg_types::REG_QWORD => "QWORD",
        _ => "UNKNOWN",
    }
}

/// Inverse of [`type_tag`]. Accepts an optional `REG_` prefix, any case.
pub fn type_from_tag(tag: &str) -> Option<u32> {
    let upper = tag.trim().to_ascii_uppercase();
    let bare = upper.strip_prefix("REG_").unwrap_or(&upper);
    match bare {
        "NONE" => Some(reg_types::REG_NONE),
        "SZ" => Some(reg_types::REG_SZ),
        "EXPAND_SZ" => Some(reg_types::REG_EXPAND_SZ),
        "BINARY" => Some(reg_types::REG_BINARY),
        "DWORD" => Some(reg_types::REG_DWORD),
        "DWORD_BIG_ENDIAN" => Some(reg_types::REG_DWORD_BIG_ENDIAN),
        "LINK" => Some(reg_types::REG_LINK),
        "MULTI_SZ" => Some(reg_types::REG_MULTI_SZ),
        "QWORD" => Some(reg_types::REG_QWORD),
        _ => None,
    }
}

/// Typed content of a registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueData {
    /// REG_SZ
    String(String),
    /// REG_EXPAND_SZ
    ExpandString(String),
    /// REG_BINARY
    Binary(Vec<u8>),
    /// Any other type, kept as raw bytes.
    Other { value_type: u32, raw: Vec<u8> },
}

impl ValueData {
    /// Registry type id of this content.
    pub fn value_type(&self) -> u32 {
        match self {
            ValueData::String(_) => reg_types::REG_SZ,
            ValueData::ExpandString(_) => reg_types::REG_EXPAND_SZ,
            ValueData::Binary(_) => reg_types::REG_BINARY,
            ValueData::Other { value_type, .. } => *value_type,
        }
    }
}

/// A named registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryValue {
    /// Value name (empty string = "(Default)" value).
    pub name: String,
    pub data: ValueData,
}

impl RegistryValue {
    pub fn new(name: impl Into<String>, data: ValueData) -> Self {
        RegistryValue {
            name: name.into(),
            data,
        }
    }

    /// REG_SZ value.
    pub fn string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, ValueData::String(text.into()))
    }

    /// REG_EXPAND_SZ value.
    pub fn expand_string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, ValueData::ExpandString(text.into()))
    }

    /// REG_BINARY value.
    pub fn binary(name: impl Into<String>, raw: impl Into<Vec<u8>>) -> Self {
        Self::new(name, ValueData::Binary(raw.into()))
    }

    /// Build a value from a registry type id and its raw data, as stored in
    /// a VK cell. String types are decoded as UTF-16LE up to the first NUL.
    pub fn from_raw(name: impl Into<String>, value_type: u32, raw: Vec<u8>) -> Self {
        let data = match value_type {
            reg_types::REG_SZ => ValueData::String(read_utf16le_string(&raw)),
            reg_types::REG_EXPAND_SZ => ValueData::ExpandString(read_utf16le_string(&raw)),
            reg_types::REG_BINARY => ValueData::Binary(raw),
            _ => ValueData::Other { value_type, raw },
        };
        Self::new(name, data)
    }

    /// Type tag string (`SZ`, `EXPAND_SZ`, `BINARY`, `DWORD`, ...).
    pub fn type_str(&self) -> &'static str {
        type_tag(self.data.value_type())
    }

    /// Decoded text for the string types, `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s) | ValueData::ExpandString(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of the value. String types are re-encoded as NUL-terminated
    /// UTF-16LE.
    pub fn raw_data(&self) -> Vec<u8> {
        match &self.data {
            ValueData::String(s) | ValueData::ExpandString(s) => {
                s.encode_utf16()
                    .chain(std::iter::once(0))
                    .flat_map(|u| u.to_le_bytes())
                    .collect()
            }
            ValueData::Binary(raw) | ValueData::Other { raw, .. } => raw.clone(),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Decode a UTF-16LE string from raw bytes, stopping at first null or end.
/// Invalid code units become U+FFFD.
pub fn read_utf16le_string(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&c| c != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decode the whole buffer as UTF-16LE, dropping unpaired surrogates and a
/// trailing odd byte. Embedded NULs are kept.
pub fn decode_utf16le_lossy(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]));
    char::decode_utf16(units).filter_map(Result::ok).collect()
}

/// Convert Windows FILETIME (100ns since 1601-01-01) to a UTC instant.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    // Windows epoch offset from Unix epoch: 11644473600 seconds
    const WINDOWS_EPOCH_OFFSET: u64 = 11_644_473_600;
    let seconds = filetime / 10_000_000;
    if seconds < WINDOWS_EPOCH_OFFSET {
        return None;
    }
    let unix_seconds = seconds - WINDOWS_EPOCH_OFFSET;
    let nanos = ((filetime % 10_000_000) * 100) as u32;
    DateTime::from_timestamp(unix_seconds as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_utf16le_decode() {
        // "SAM" in UTF-16LE
        let data = [b'S', 0, b'A', 0, b'M', 0, 0, 0];
        assert_eq!(read_utf16le_string(&data), "SAM");
    }

    #[test]
    fn test_utf16le_decode_no_null() {
        let data = [b'H', 0, b'i', 0];
        assert_eq!(read_utf16le_string(&data), "Hi");
    }

    #[test]
    fn test_lossy_decode_drops_lone_surrogate() {
        let mut data = utf16("ab");
        data.extend_from_slice(&0xD800u16.to_le_bytes());
        data.extend_from_slice(&utf16("c"));
        data.push(0x41); // dangling odd byte
        assert_eq!(decode_utf16le_lossy(&data), "abc");
    }

    #[test]
    fn test_lossy_decode_keeps_embedded_nul() {
        assert_eq!(decode_utf16le_lossy(&utf16("foo\0bar")), "foo\0bar");
    }

    #[test]
    fn test_from_raw_string_types() {
        let v = RegistryValue::from_raw("0", reg_types::REG_SZ, utf16("C:\\a.txt\0junk"));
        assert_eq!(v.data, ValueData::String("C:\\a.txt".to_string()));
        assert_eq!(v.type_str(), "SZ");

        let v = RegistryValue::from_raw("1", reg_types::REG_EXPAND_SZ, utf16("%TEMP%"));
        assert_eq!(v.as_str(), Some("%TEMP%"));
        assert_eq!(v.type_str(), "EXPAND_SZ");
    }

    #[test]
    fn test_from_raw_other_types() {
        let v = RegistryValue::from_raw("n", reg_types::REG_DWORD, vec![1, 0, 0, 0]);
        assert_eq!(v.type_str(), "DWORD");
        assert!(v.as_str().is_none());
        assert_eq!(v.raw_data(), vec![1, 0, 0, 0]);

        let v = RegistryValue::from_raw("n", 0x99, vec![]);
        assert_eq!(v.type_str(), "UNKNOWN");
    }

    #[test]
    fn test_string_raw_data_is_utf16_with_terminator() {
        let v = RegistryValue::string("3", "ab");
        assert_eq!(v.raw_data(), vec![b'a', 0, b'b', 0, 0, 0]);
    }

    #[test]
    fn test_type_tag_round_trip_names() {
        assert_eq!(type_from_tag("REG_BINARY"), Some(reg_types::REG_BINARY));
        assert_eq!(type_from_tag("expand_sz"), Some(reg_types::REG_EXPAND_SZ));
        assert_eq!(type_from_tag("bogus"), None);
        assert_eq!(type_tag(reg_types::REG_QWORD), "QWORD");
    }

    #[test]
    fn test_filetime_to_datetime() {
        // 2012-01-01T00:00:00Z
        let ft = (1_325_376_000u64 + 11_644_473_600) * 10_000_000;
        let dt = filetime_to_datetime(ft).unwrap();
        assert_eq!(dt.to_rfc3339(), "2012-01-01T00:00:00+00:00");
        assert!(filetime_to_datetime(0).is_none());
        assert!(filetime_to_datetime(1).is_none());
    }
}
