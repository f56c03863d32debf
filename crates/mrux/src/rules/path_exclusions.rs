//! Key paths the MRUListEx plugin must not handle.
//!
//! Shell bags and the Explorer stream cache carry an `MRUListEx` value too,
//! but their numbered values hold shell item lists, not display strings.

/// A key-path pattern excluded from MRUListEx processing.
pub struct PathExclusion {
    /// Substring matched against the full key path (case-sensitive).
    pub pattern: &'static str,
    pub description: &'static str,
}

/// Known incompatible MRU layouts.
pub static MRU_PATH_EXCLUSIONS: &[PathExclusion] = &[
    PathExclusion {
        pattern: "BagMRU",
        description: "Shell bag tree; entries are shell item lists",
    },
    PathExclusion {
        pattern: "Explorer\\StreamMRU",
        description: "Explorer stream cache; entries are binary stream records",
    },
];

/// First exclusion matching `path`, if any.
pub fn find_exclusion(path: &str) -> Option<&'static PathExclusion> {
    MRU_PATH_EXCLUSIONS.iter().find(|ex| path.contains(ex.pattern))
}

/// Whether `path` falls under an incompatible MRU layout.
pub fn is_excluded(path: &str) -> bool {
    find_exclusion(path).is_some()
}
