//! The registry key abstraction consumed by artifact parsers.

use crate::types::RegistryValue;
use chrono::{DateTime, Utc};

/// Read access to one registry key.
///
/// Implementations answer synchronously. A missing value is an ordinary
/// `None`, never an error.
pub trait RegistryKey {
    /// Full key path, components separated by `\`.
    fn path(&self) -> &str;

    /// Last-written time of the key.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Look up a value by name. Names compare case-insensitively.
    fn value(&self, name: &str) -> Option<RegistryValue>;

    /// Names of all values in the key, in stored order.
    fn value_names(&self) -> Vec<String>;

    /// Whether a value with this name exists.
    fn has_value(&self, name: &str) -> bool {
        self.value(name).is_some()
    }
}
