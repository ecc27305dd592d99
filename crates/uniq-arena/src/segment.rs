//! Raw memory segments and growable segment lists.
//!
//! A [`Segment`] is one contiguous block with a bump cursor. A
//! [`SegmentList`] is a growable collection of segments that overflows
//! into new segments when the current one is full.

use std::ptr::NonNull;

use crate::config::ArenaConfig;
use crate::raw::{RawBlock, BLOCK_ALIGN};

/// A single contiguous memory segment with bump allocation.
///
/// Segments are never freed during runtime, only dropped together with
/// the arena that owns them.
pub struct Segment {
    /// Backing storage. Uninitialised until handed out.
    block: RawBlock,
    /// Bump pointer: offset of the next free byte.
    cursor: usize,
}

impl Segment {
    /// Create a new segment of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_align(capacity, BLOCK_ALIGN)
    }

    fn with_align(capacity: usize, align: usize) -> Self {
        Self {
            block: RawBlock::new(capacity, align),
            cursor: 0,
        }
    }

    /// Bump-allocate `size` bytes aligned to `align`.
    ///
    /// Returns `None` if the remaining capacity cannot hold the request
    /// after alignment padding. `align` must be a power of two.
    pub fn alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        debug_assert!(align.is_power_of_two());
        let base = self.block.base().as_ptr();
        let addr = base.addr().checked_add(self.cursor)?;
        let aligned = addr.checked_add(align - 1)? & !(align - 1);
        let start = aligned - base.addr();
        let end = start.checked_add(size)?;
        if end > self.block.len() {
            return None;
        }
        self.cursor = end;
        NonNull::new(base.wrapping_add(start))
    }

    /// Number of bytes consumed, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    /// Remaining free capacity in bytes (before alignment padding).
    pub fn remaining(&self) -> usize {
        self.block.len() - self.cursor
    }
}

/// A growable list of [`Segment`]s with overflow-based bump allocation.
///
/// When the current segment is full, a new, possibly larger segment is
/// appended. Requests that would not fit a fresh regular segment are
/// placed in a dedicated segment sized for them, so the regular segment
/// being filled is not abandoned.
pub struct SegmentList {
    segments: Vec<Segment>,
    dedicated: Vec<Segment>,
    config: ArenaConfig,
    /// Sum of requested sizes, excluding padding.
    requested: usize,
}

impl SegmentList {
    /// Create an empty segment list. The first segment is allocated lazily.
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            segments: Vec::new(),
            dedicated: Vec::new(),
            config,
            requested: 0,
        }
    }

    /// Bump-allocate `size` bytes aligned to `align`, growing if needed.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    pub fn alloc(&mut self, size: usize, align: usize) -> NonNull<u8> {
        assert!(
            align.is_power_of_two(),
            "arena alignment must be a power of two, got {align}"
        );
        self.requested += size;

        // Try the current segment first.
        if let Some(ptr) = self.segments.last_mut().and_then(|s| s.alloc(size, align)) {
            return ptr;
        }

        let segment_size = self.config.segment_bytes_for(self.segments.len());
        let worst_case = size.saturating_add(align - 1);
        if worst_case > segment_size {
            // Oversized: give it a block of its own, aligned up front.
            let mut seg = Segment::with_align(size, align);
            let ptr = seg
                .alloc(size, align)
                .expect("dedicated segment is sized and aligned for the request");
            self.dedicated.push(seg);
            return ptr;
        }

        let mut seg = Segment::new(segment_size);
        let ptr = seg
            .alloc(size, align)
            .expect("size + align - 1 <= segment_size, so a fresh segment always fits");
        self.segments.push(seg);
        ptr
    }

    /// Number of segments, regular and dedicated.
    pub fn segment_count(&self) -> usize {
        self.segments.len() + self.dedicated.len()
    }

    /// Bytes reserved from the system allocator.
    pub fn memory_bytes(&self) -> usize {
        self.segments
            .iter()
            .chain(&self.dedicated)
            .map(Segment::capacity)
            .sum()
    }

    /// Bytes requested by callers, excluding alignment padding.
    pub fn requested_bytes(&self) -> usize {
        self.requested
    }
}
