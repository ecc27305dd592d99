//! The arena allocator shared by all storage classes of one uniquer.

use std::ptr::NonNull;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{ArenaSlice, ArenaStr};
use crate::raw::{self, DropList, PinnedSlice, PinnedStr, Pool};

/// Append-only allocator for uniqued instances and their payloads.
///
/// Allocation is thread-safe: the segment list sits behind its own lock,
/// independent of any lock held by the caller. There is no deallocation.
/// Values moved in with [`alloc`](Arena::alloc) are dropped in reverse
/// allocation order when the arena itself drops; raw memory is released
/// once the arena and every [`ArenaSlice`]/[`ArenaStr`] handle are gone.
pub struct Arena {
    pool: Arc<Pool>,
    drops: Mutex<DropList>,
}

impl Arena {
    /// Create an arena with the given configuration.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ArenaConfig) -> Self {
        Self {
            pool: Arc::new(Pool::new(config)),
            drops: Mutex::new(DropList::default()),
        }
    }

    /// Reserve `size` bytes aligned to `align`.
    ///
    /// The memory is uninitialised and stays reserved until the arena and
    /// all of its handles are gone.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    pub fn allocate_bytes(&self, size: usize, align: usize) -> NonNull<u8> {
        self.pool.allocate(size, align)
    }

    /// Move `value` into the arena.
    ///
    /// `T` must be `'static` because its destructor runs at arena teardown.
    pub fn alloc<T: Send + Sync + 'static>(&self, value: T) -> &T {
        raw::emplace(&self.pool, &self.drops, value)
    }

    /// Copy `elements` into the arena.
    ///
    /// An empty input returns an empty slice without allocating.
    pub fn alloc_slice_copy<T: Copy + Send + Sync>(&self, elements: &[T]) -> ArenaSlice<T> {
        ArenaSlice::from_pinned(PinnedSlice::copy_from(&self.pool, elements))
    }

    /// Allocate `len` contiguous elements, initialising element `i` with
    /// `f(i)`.
    pub fn alloc_slice_fill_with<T, F>(&self, len: usize, f: F) -> ArenaSlice<T>
    where
        T: Copy + Send + Sync,
        F: FnMut(usize) -> T,
    {
        ArenaSlice::from_pinned(PinnedSlice::fill_with(&self.pool, len, f))
    }

    /// Copy `text` into the arena.
    pub fn alloc_str(&self, text: &str) -> ArenaStr {
        ArenaStr::from_pinned(PinnedStr::copy_from(&self.pool, text))
    }

    /// Copy a byte buffer into the arena.
    pub fn copy_bytes(&self, bytes: &[u8]) -> ArenaSlice<u8> {
        self.alloc_slice_copy(bytes)
    }

    /// Bytes requested by callers so far, excluding alignment padding.
    pub fn allocated_bytes(&self) -> usize {
        self.pool.inspect(|s| s.requested_bytes())
    }

    /// Bytes reserved from the system allocator.
    pub fn memory_bytes(&self) -> usize {
        self.pool.inspect(|s| s.memory_bytes())
    }

    /// Number of segments currently reserved.
    pub fn segment_count(&self) -> usize {
        self.pool.inspect(|s| s.segment_count())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::from_valid(ArenaConfig::default())
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        std::mem::take(self.drops.get_mut()).run();
    }
}
