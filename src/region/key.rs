//! Call-site identity for regions.

use std::hash::{Hash, Hasher};

/// Identifies a lexical loop invocation point for per-site learning.
///
/// Keys are stable for the lifetime of a process run; they are not required
/// to be stable across runs (and `from_location` keys are not, since file
/// paths feed the hash). Each unique key owns exactly one [`Region`]
/// instance in the registry.
///
/// [`Region`]: crate::region::Region
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RegionKey(pub u64);

impl RegionKey {
    /// Create a key from a lexical source location.
    ///
    /// The [`adaptive_for_each!`] macro calls this with
    /// `file!()/line!()/column!()`, giving every expansion site its own
    /// region without any per-call allocation.
    ///
    /// [`adaptive_for_each!`]: crate::adaptive_for_each
    pub fn from_location(file: &str, line: u32, column: u32) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        file.hash(&mut hasher);
        line.hash(&mut hasher);
        column.hash(&mut hasher);
        RegionKey(hasher.finish())
    }

    /// Create a key from a string identifier.
    ///
    /// Useful when the same lexical site dispatches logically distinct
    /// loops, or when a caller wants a name it can correlate with oracle
    /// traces:
    /// ```ignore
    /// let key = RegionKey::from_name("pressure_solve");
    /// ```
    pub fn from_name(s: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        s.hash(&mut hasher);
        RegionKey(hasher.finish())
    }
}
