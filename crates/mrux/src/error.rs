//! Error types for MRU parsing and event output.

use thiserror::Error;

/// MRU parsing and output errors.
#[derive(Debug, Error)]
pub enum MruError {
    #[error("MRU index is empty")]
    EmptyIndex,

    #[error("MRU index length {len} is not a multiple of 4")]
    Misaligned { len: usize },

    #[error("MRU index has more than {max} entries before the terminator")]
    TooManyEntries { max: usize },

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Event sink error: {0}")]
    Sink(String),
}

pub type MruResult<T> = Result<T, MruError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert!(MruError::Misaligned { len: 7 }.to_string().contains('7'));
        assert!(MruError::TooManyEntries { max: 500 }.to_string().contains("500"));
    }
}
