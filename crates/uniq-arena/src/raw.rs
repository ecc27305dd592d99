//! Low-level primitives for arena memory operations.
//!
//! Every `unsafe` block in this crate lives in this module, each with a
//! mandatory `// SAFETY:` comment. The functions exported to the rest of
//! the crate are safe: they only hand out pointers to memory they have
//! just allocated and initialised, tied to the lifetime of the owner.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ArenaConfig;
use crate::segment::SegmentList;

/// Minimum alignment of every block obtained from the global allocator.
pub(crate) const BLOCK_ALIGN: usize = 16;

/// An owned, uninitialised block from the global allocator.
pub(crate) struct RawBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: a RawBlock is plain bytes with a unique owner. Regions handed out
// from it are disjoint, and the bump cursor guarding them is only touched
// under the SegmentList mutex.
unsafe impl Send for RawBlock {}
// SAFETY: see above; `&RawBlock` only exposes the base address and length.
unsafe impl Sync for RawBlock {}

impl RawBlock {
    /// Allocate `size` bytes aligned to at least `align`.
    ///
    /// Aborts through [`alloc::handle_alloc_error`] if the system is out of
    /// memory.
    pub(crate) fn new(size: usize, align: usize) -> Self {
        let layout = Layout::from_size_align(size.max(1), align.max(BLOCK_ALIGN))
            .unwrap_or_else(|_| panic!("invalid arena block layout: {size} bytes, align {align}"));
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Self { ptr, layout }
    }

    pub(crate) fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `alloc::alloc` with exactly this layout and
        // is deallocated only here.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Segment storage shared between an arena and the handles it hands out.
///
/// Memory is released when the last `Arc<Pool>` drops.
pub(crate) struct Pool {
    segments: Mutex<SegmentList>,
}

impl Pool {
    pub(crate) fn new(config: ArenaConfig) -> Self {
        Self {
            segments: Mutex::new(SegmentList::new(config)),
        }
    }

    /// Reserve `size` bytes aligned to `align`. The memory is uninitialised.
    pub(crate) fn allocate(&self, size: usize, align: usize) -> NonNull<u8> {
        self.segments.lock().alloc(size, align)
    }

    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&SegmentList) -> R) -> R {
        f(&self.segments.lock())
    }
}

/// Destructor of one arena-resident value.
struct DropEntry {
    ptr: NonNull<u8>,
    drop_fn: unsafe fn(NonNull<u8>),
}

/// # Safety
///
/// `ptr` must point at a live, initialised `T` that is never used again.
unsafe fn drop_erased<T>(ptr: NonNull<u8>) {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::drop_in_place(ptr.cast::<T>().as_ptr()) }
}

/// Destructors of arena-resident values, run once at arena teardown.
#[derive(Default)]
pub(crate) struct DropList {
    entries: Vec<DropEntry>,
}

// SAFETY: entries only point at values whose type is `Send` (enforced by
// `emplace`), so running their destructors on another thread is sound.
unsafe impl Send for DropList {}

impl DropList {
    /// Run every recorded destructor in reverse allocation order.
    pub(crate) fn run(self) {
        for entry in self.entries.into_iter().rev() {
            // SAFETY: each entry was recorded by `emplace` for a value that
            // was initialised in pool memory and is dropped exactly once,
            // here. The arena is being torn down, so no reference to the
            // value is still alive.
            unsafe { (entry.drop_fn)(entry.ptr) }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Move `value` into pool memory.
///
/// The returned reference lives as long as the borrow of `pool`; the value
/// itself is dropped by [`DropList::run`] if its type needs dropping.
pub(crate) fn emplace<'a, T: Send + Sync>(
    pool: &'a Pool,
    drops: &Mutex<DropList>,
    value: T,
) -> &'a T {
    let slot = pool
        .allocate(mem::size_of::<T>(), mem::align_of::<T>())
        .cast::<T>();
    // SAFETY: `slot` is freshly allocated, sized and aligned for `T`, and
    // disjoint from every other allocation.
    unsafe { slot.as_ptr().write(value) };
    if mem::needs_drop::<T>() {
        drops.lock().entries.push(DropEntry {
            ptr: slot.cast(),
            drop_fn: drop_erased::<T>,
        });
    }
    // SAFETY: the value was initialised above and pool memory is released
    // only when the pool drops, which the `'a` borrow outlives. The value is
    // never written through `slot` again.
    unsafe { &*slot.as_ptr() }
}

/// An immutable run of `T` in pool memory that keeps its pool alive.
pub(crate) struct PinnedSlice<T> {
    ptr: NonNull<T>,
    len: usize,
    pool: Option<Arc<Pool>>,
}

// SAFETY: a PinnedSlice only grants shared access to its elements, so
// sending or sharing it is sound when `T: Sync`.
unsafe impl<T: Sync> Send for PinnedSlice<T> {}
// SAFETY: see above.
unsafe impl<T: Sync> Sync for PinnedSlice<T> {}

impl<T: Copy> PinnedSlice<T> {
    pub(crate) fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            pool: None,
        }
    }

    pub(crate) fn copy_from(pool: &Arc<Pool>, src: &[T]) -> Self {
        if src.is_empty() {
            return Self::empty();
        }
        let dst = Self::reserve(pool, src.len());
        // SAFETY: `dst` is fresh pool memory with room for `src.len()`
        // elements, aligned for `T`, and cannot overlap `src`.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len()) };
        Self {
            ptr: dst,
            len: src.len(),
            pool: Some(Arc::clone(pool)),
        }
    }

    pub(crate) fn fill_with(pool: &Arc<Pool>, len: usize, mut f: impl FnMut(usize) -> T) -> Self {
        if len == 0 {
            return Self::empty();
        }
        let dst = Self::reserve(pool, len);
        for i in 0..len {
            // SAFETY: `i < len` and `dst` has room for `len` elements. If `f`
            // panics the partially written region is simply abandoned; `T`
            // is `Copy`, so nothing needs dropping.
            unsafe { dst.as_ptr().add(i).write(f(i)) };
        }
        Self {
            ptr: dst,
            len,
            pool: Some(Arc::clone(pool)),
        }
    }

    fn reserve(pool: &Pool, len: usize) -> NonNull<T> {
        let layout = Layout::array::<T>(len)
            .unwrap_or_else(|_| panic!("arena array of {len} elements overflows isize"));
        pool.allocate(layout.size(), layout.align()).cast::<T>()
    }
}

impl<T> PinnedSlice<T> {
    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` and `len` describe initialised memory that is never
        // written again, kept alive by `pool`; or `len == 0` with a dangling,
        // well-aligned pointer.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

impl<T> Clone for PinnedSlice<T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            len: self.len,
            pool: self.pool.clone(),
        }
    }
}

/// UTF-8 text in pool memory.
#[derive(Clone)]
pub(crate) struct PinnedStr {
    bytes: PinnedSlice<u8>,
}

impl PinnedStr {
    pub(crate) fn copy_from(pool: &Arc<Pool>, src: &str) -> Self {
        Self {
            bytes: PinnedSlice::copy_from(pool, src.as_bytes()),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: the bytes were copied verbatim from a `&str` and are
        // immutable.
        unsafe { std::str::from_utf8_unchecked(self.bytes.as_slice()) }
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}
