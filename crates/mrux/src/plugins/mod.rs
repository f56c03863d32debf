//! Registry key plugins.
//!
//! Plugins are plain table entries. A key is routed to a plugin when it holds
//! a value named after one of the plugin's triggers and the plugin's path
//! filter accepts the key path.

pub mod mrulistex;

use crate::error::{MruError, MruResult};
use crate::events::{EventSink, MruRecord};
use regkey::RegistryKey;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::ops::AddAssign;
use tracing::{debug, warn};

/// Lazy record sequence produced by a plugin for one key.
pub type RecordIter<'k> = Box<dyn Iterator<Item = MruRecord> + 'k>;

/// Receives non-fatal parse problems found while processing a key.
pub trait ParseObserver {
    /// The key's index value could not be decoded; the key yields no records.
    fn malformed_index(&self, key_path: &str, error: &MruError);
}

/// Reports parse problems as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ParseObserver for TracingObserver {
    fn malformed_index(&self, key_path: &str, error: &MruError) {
        warn!("Unable to parse the MRU key {}: {}", key_path, error);
    }
}

/// A registered plugin.
pub struct PluginEntry {
    /// Unique plugin name.
    pub name: &'static str,
    pub description: &'static str,
    /// Value names that route a key to this plugin.
    pub triggers: &'static [&'static str],
    /// Key path filter; `false` vetoes the plugin for that key.
    pub filter: fn(&str) -> bool,
    pub process: for<'k> fn(&'k dyn RegistryKey, &'k dyn ParseObserver) -> RecordIter<'k>,
}

/// All built-in plugins, in registration order.
pub static PLUGINS: &[PluginEntry] = &[mrulistex::ENTRY];

/// Plugin lookup table keyed by trigger value name.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<&'static PluginEntry>,
    /// Lowercased trigger name → indices into `plugins`.
    by_trigger: HashMap<String, Vec<usize>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for plugin in PLUGINS {
            registry.register(plugin);
        }
        registry
    }

    /// Add a plugin. A plugin already registered under the same name is kept.
    pub fn register(&mut self, plugin: &'static PluginEntry) {
        if self.get(plugin.name).is_some() {
            debug!("plugins: {} already registered", plugin.name);
            return;
        }
        let idx = self.plugins.len();
        self.plugins.push(plugin);
        for trigger in plugin.triggers {
            self.by_trigger
                .entry(trigger.to_lowercase())
                .or_default()
                .push(idx);
        }
    }

    /// Look up a plugin by name.
    pub fn get(&self, name: &str) -> Option<&'static PluginEntry> {
        self.plugins.iter().copied().find(|p| p.name == name)
    }

    /// Names of registered plugins, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Keep only the named plugins. Fails on a name that is not registered.
    pub fn restrict_to(self, names: &[String]) -> MruResult<Self> {
        let mut restricted = Self::new();
        for name in names {
            let plugin = self
                .get(name)
                .ok_or_else(|| MruError::UnknownPlugin(name.clone()))?;
            restricted.register(plugin);
        }
        Ok(restricted)
    }

    /// Plugins that apply to `key`, in registration order.
    pub fn select(&self, key: &dyn RegistryKey) -> Vec<&'static PluginEntry> {
        let mut hits = BTreeSet::new();
        for name in key.value_names() {
            if let Some(indices) = self.by_trigger.get(&name.to_lowercase()) {
                hits.extend(indices.iter().copied());
            }
        }
        hits.into_iter()
            .map(|idx| self.plugins[idx])
            .filter(|plugin| (plugin.filter)(key.path()))
            .collect()
    }
}

/// Totals for one [`scan`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub keys_seen: usize,
    /// Keys at least one plugin was selected for.
    pub keys_matched: usize,
    /// Keys whose index could not be decoded.
    pub keys_malformed: usize,
    pub records: usize,
}

impl AddAssign for ScanSummary {
    fn add_assign(&mut self, other: Self) {
        self.keys_seen += other.keys_seen;
        self.keys_matched += other.keys_matched;
        self.keys_malformed += other.keys_malformed;
        self.records += other.records;
    }
}

/// Forwards reports and counts them.
struct CountingObserver<'o> {
    inner: &'o dyn ParseObserver,
    count: Cell<usize>,
}

impl ParseObserver for CountingObserver<'_> {
    fn malformed_index(&self, key_path: &str, error: &MruError) {
        self.count.set(self.count.get() + 1);
        self.inner.malformed_index(key_path, error);
    }
}

/// Run every applicable plugin over every key and emit the results.
///
/// Parse problems go to `observer` and never stop the scan. Sink errors do.
pub fn scan<'a, K>(
    registry: &PluginRegistry,
    keys: impl IntoIterator<Item = &'a K>,
    observer: &dyn ParseObserver,
    sink: &mut dyn EventSink,
) -> MruResult<ScanSummary>
where
    K: RegistryKey + 'a,
{
    let counting = CountingObserver {
        inner: observer,
        count: Cell::new(0),
    };
    let mut summary = ScanSummary::default();

    for key in keys {
        summary.keys_seen += 1;
        let key: &dyn RegistryKey = key;
        let selected = registry.select(key);
        if selected.is_empty() {
            continue;
        }
        summary.keys_matched += 1;

        for plugin in selected {
            debug!("plugins: running {} on {}", plugin.name, key.path());
            for record in (plugin.process)(key, &counting) {
                sink.emit(record.into_event())?;
                summary.records += 1;
            }
        }
    }

    summary.keys_malformed = counting.count.get();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RegistryEvent;
    use chrono::{DateTime, Utc};
    use regkey::{KeySnapshot, RegistryValue};

    fn ts() -> DateTime<Utc> {
        DateTime::from_timestamp(1_330_837_567, 0).unwrap()
    }

    fn index(entries: &[u32]) -> RegistryValue {
        RegistryValue::binary(
            "MRUListEx",
            entries.iter().flat_map(|e| e.to_le_bytes()).collect::<Vec<u8>>(),
        )
    }

    fn keys() -> Vec<KeySnapshot> {
        vec![
            KeySnapshot::new("HKCU\\Software\\X\\RecentDocs", ts())
                .with_value(index(&[3, 1, 0xFFFF_FFFF]))
                .with_value(RegistryValue::string("3", "fileA.txt"))
                .with_value(RegistryValue::string("1", "fileB.txt")),
            KeySnapshot::new("HKCU\\Software\\X\\BagMRU\\1", ts())
                .with_value(index(&[0, 0xFFFF_FFFF])),
            KeySnapshot::new("HKCU\\Software\\X\\Broken", ts())
                .with_value(RegistryValue::binary("MRUListEx", vec![1, 2, 3])),
            KeySnapshot::new("HKCU\\Software\\X\\Unrelated", ts())
                .with_value(RegistryValue::string("Path", "C:\\")),
        ]
    }

    struct NullObserver;

    impl ParseObserver for NullObserver {
        fn malformed_index(&self, _key_path: &str, _error: &MruError) {}
    }

    /// Sink that rejects everything.
    struct ClosedSink;

    impl EventSink for ClosedSink {
        fn emit(&mut self, _event: RegistryEvent) -> MruResult<()> {
            Err(MruError::Sink("closed".to_string()))
        }
    }

    #[test]
    fn test_defaults_registered() {
        let registry = PluginRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["mrulistex"]);
        assert!(registry.get("mrulistex").is_some());
        assert!(registry.get("bagmru").is_none());
    }

    #[test]
    fn test_register_twice_is_noop() {
        let mut registry = PluginRegistry::with_defaults();
        registry.register(&mrulistex::ENTRY);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_select_by_trigger_and_filter() {
        let registry = PluginRegistry::with_defaults();
        let keys = keys();
        assert_eq!(registry.select(&keys[0]).len(), 1);
        assert!(registry.select(&keys[1]).is_empty()); // excluded path
        assert_eq!(registry.select(&keys[2]).len(), 1);
        assert!(registry.select(&keys[3]).is_empty()); // no trigger

        let zero = KeySnapshot::new("HKCU\\Software\\X\\OpenSave", ts())
            .with_value(RegistryValue::string("0", "a.doc"));
        assert_eq!(registry.select(&zero).len(), 1);
    }

    #[test]
    fn test_select_trigger_case_insensitive() {
        let registry = PluginRegistry::with_defaults();
        let key = KeySnapshot::new("HKCU\\Software\\X\\RecentDocs", ts())
            .with_value(RegistryValue::binary("mrulistex", vec![0xff; 4]));
        assert_eq!(registry.select(&key).len(), 1);
    }

    #[test]
    fn test_restrict_to() {
        let registry = PluginRegistry::with_defaults()
            .restrict_to(&["mrulistex".to_string()])
            .unwrap();
        assert_eq!(registry.len(), 1);

        let err = PluginRegistry::with_defaults()
            .restrict_to(&["shellbags".to_string()])
            .err()
            .unwrap();
        assert!(matches!(err, MruError::UnknownPlugin(name) if name == "shellbags"));
    }

    #[test]
    fn test_empty_registry_selects_nothing() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.select(&keys()[0]).is_empty());
    }

    #[test]
    fn test_scan_collects_events() {
        let registry = PluginRegistry::with_defaults();
        let keys = keys();
        let mut events: Vec<RegistryEvent> = Vec::new();

        let summary = scan(&registry, &keys, &NullObserver, &mut events).unwrap();
        assert_eq!(
            summary,
            ScanSummary {
                keys_seen: 4,
                keys_matched: 2,
                keys_malformed: 1,
                records: 2,
            }
        );

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].regvalue.get("MRUListEx Entry 3 (nr. 1)").map(String::as_str),
            Some("fileA.txt")
        );
        assert_eq!(events[0].timestamp, Some(ts()));
        assert_eq!(events[1].timestamp, None);
        assert_eq!(events[1].source_append, ": MRUx List");
    }

    #[test]
    fn test_scan_stops_on_sink_error() {
        let registry = PluginRegistry::with_defaults();
        let keys = keys();
        let err = scan(&registry, &keys, &NullObserver, &mut ClosedSink).unwrap_err();
        assert!(matches!(err, MruError::Sink(_)));
    }

    #[test]
    fn test_summary_add_assign() {
        let mut total = ScanSummary::default();
        total += ScanSummary {
            keys_seen: 2,
            keys_matched: 1,
            keys_malformed: 0,
            records: 5,
        };
        total += ScanSummary {
            keys_seen: 1,
            keys_matched: 1,
            keys_malformed: 1,
            records: 0,
        };
        assert_eq!(total.keys_seen, 3);
        assert_eq!(total.keys_matched, 2);
        assert_eq!(total.keys_malformed, 1);
        assert_eq!(total.records, 5);
    }
}
