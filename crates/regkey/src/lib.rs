//! Registry key access layer for artifact parsers.
//!
//! Parsers in this workspace never read hive files directly. They see a key
//! through the [`RegistryKey`] trait: a path, a last-written timestamp, and a
//! lookup of named values. This crate provides:
//!
//! - [`ValueData`] / [`RegistryValue`]: a closed, typed view of value content
//! - Registry type ids (`reg_types`) and their tag strings (`SZ`, `BINARY`, ...)
//! - UTF-16LE and FILETIME helpers shared by value decoding
//! - [`KeySnapshot`]: an owned key that implements [`RegistryKey`] and can be
//!   loaded from a JSON export
//!
//! # Example
//!
//! ```rust,ignore
//! use regkey::{load_snapshots, RegistryKey};
//!
//! for key in load_snapshots("ntuser_export.json")? {
//!     if let Some(v) = key.value("MRUListEx") {
//!         println!("{}: {} bytes", key.path(), v.raw_data().len());
//!     }
//! }
//! ```

pub mod error;
pub mod key;
pub mod snapshot;
pub mod types;

// Re-export key types at crate root.
pub use error::{RegKeyError, RegKeyResult};
pub use key::RegistryKey;
pub use snapshot::{load_snapshots, parse_snapshots, KeySnapshot};
pub use types::{
    decode_utf16le_lossy, filetime_to_datetime, read_utf16le_string, reg_types, type_from_tag,
    type_tag, RegistryValue, ValueData,
};
