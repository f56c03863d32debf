//! Static routing rules for registry plugins.
//!
//! Several MRU encodings share trigger value names but use different
//! layouts. These tables keep keys away from plugins that cannot decode them.

pub mod path_exclusions;
