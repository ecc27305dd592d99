//! Strongly-typed identifiers for storage classes and kinds.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for [`StorageTag::next`] allocation.
static STORAGE_TAG_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies a concrete storage class within a uniquer.
///
/// Tags are opaque: the uniquer only compares and hashes them to find the
/// registry entry for a storage class. They are normally handed out by an
/// external tag registry; [`StorageTag::next`] is provided for callers
/// without one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageTag(pub u64);

impl StorageTag {
    /// Allocate a fresh, process-unique tag.
    ///
    /// Each call returns a tag that has never been returned before within
    /// this process. Thread-safe. Tags built with `From<u64>` are not
    /// tracked, so mixing both schemes is the caller's responsibility.
    pub fn next() -> Self {
        Self(STORAGE_TAG_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StorageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StorageTag {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Discriminates sibling representations that share one storage shape.
///
/// Supplied by the caller on every `get`, stored on the instance by the
/// uniquer, and read-only afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(pub u32);

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Kind {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
