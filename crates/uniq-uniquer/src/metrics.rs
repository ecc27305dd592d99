//! Counters describing uniquer activity.
//!
//! [`UniquerStats`] is a point-in-time snapshot built by
//! [`StorageUniquer::stats`](crate::StorageUniquer::stats). The live
//! counters are relaxed atomics updated on every operation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of uniquer activity since creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniquerStats {
    /// Number of registered storage tags.
    pub registered_tags: usize,
    /// Instances currently reachable through the registry.
    pub live_instances: usize,
    /// Instances constructed, keyed and kind-only.
    pub constructed: u64,
    /// `get` calls answered with an existing instance.
    pub lookup_hits: u64,
    /// Instances removed by `erase`.
    pub erased: u64,
    /// Mutations the storage class accepted.
    pub mutations: u64,
    /// Mutations the storage class rejected.
    pub mutation_failures: u64,
    /// Bytes requested from the arena, excluding padding.
    pub arena_allocated_bytes: usize,
    /// Bytes the arena reserved from the system allocator.
    pub arena_memory_bytes: usize,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) constructed: AtomicU64,
    pub(crate) lookup_hits: AtomicU64,
    pub(crate) erased: AtomicU64,
    pub(crate) mutations: AtomicU64,
    pub(crate) mutation_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
