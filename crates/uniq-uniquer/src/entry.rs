//! Per-tag registry entries and their concurrency guard.

use parking_lot::{Mutex, MutexGuard};
use uniq_core::StorageTag;

use crate::slot::SlotTable;

/// Instances of one storage tag behind one lock.
///
/// The lock covers lookup, insertion, erasure and mutation for the tag.
/// Work on different tags never contends here.
pub(crate) struct RegistryEntry {
    tag: StorageTag,
    table: Mutex<SlotTable>,
}

impl RegistryEntry {
    pub(crate) fn new(tag: StorageTag) -> Self {
        Self {
            tag,
            table: Mutex::new(SlotTable::default()),
        }
    }

    /// Acquire the entry for one operation.
    ///
    /// With multithreading enabled this blocks until the lock is free.
    /// With it disabled the uniquer promises there is no concurrency, so
    /// the lock is only probed; finding it held means that promise was
    /// broken (or a storage hook re-entered the uniquer for this tag).
    ///
    /// # Panics
    ///
    /// Panics on contention while multithreading is disabled.
    #[track_caller]
    pub(crate) fn acquire(&self, threaded: bool) -> MutexGuard<'_, SlotTable> {
        if threaded {
            return self.table.lock();
        }
        match self.table.try_lock() {
            Some(guard) => guard,
            None => panic!(
                "storage tag {} accessed concurrently while multithreading is disabled",
                self.tag
            ),
        }
    }
}
