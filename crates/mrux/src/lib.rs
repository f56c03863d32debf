//! mrux: MRUListEx extraction from Windows registry keys.
//!
//! Keys are read through [`regkey::RegistryKey`]. Plugins are routed by the
//! value names a key contains (see [`plugins::PluginRegistry`]); each selected
//! plugin yields records lazily, and [`plugins::scan`] forwards them to an
//! [`events::EventSink`].

pub mod config;
pub mod error;
pub mod events;
pub mod plugins;
pub mod rules;

pub use error::{MruError, MruResult};
pub use events::{EventSink, JsonLinesSink, MruRecord, RegistryEvent};
pub use plugins::mrulistex::{
    applies, decode_index_list, enumerate, enumerate_with, resolve_label, IndexList,
    MruListExIter,
};
pub use plugins::{scan, ParseObserver, PluginEntry, PluginRegistry, ScanSummary, TracingObserver};
