//! Error types for the regkey crate.

use thiserror::Error;

/// Errors raised while loading or building registry keys.
#[derive(Debug, Error)]
pub enum RegKeyError {
    #[error("Snapshot file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Invalid timestamp in key '{path}': {msg}")]
    InvalidTimestamp { path: String, msg: String },

    #[error("Invalid value '{name}': {msg}")]
    InvalidValue { name: String, msg: String },

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),
}

pub type RegKeyResult<T> = Result<T, RegKeyError>;
