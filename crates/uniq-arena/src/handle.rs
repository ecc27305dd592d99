//! Handles to arena-resident slices and strings.
//!
//! [`ArenaSlice`] and [`ArenaStr`] let storage classes keep variable-length
//! payloads in the arena without carrying a lifetime parameter. Each handle
//! keeps the arena's segments alive, so it stays valid even if it outlives
//! the [`Arena`](crate::Arena) that created it. Cloning a handle is cheap
//! and shares the same memory.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use crate::raw::{PinnedSlice, PinnedStr};

/// An immutable array of `T` copied into an arena.
///
/// Equality and hashing are by content, so handles can participate in
/// storage keys directly.
#[derive(Clone)]
pub struct ArenaSlice<T> {
    inner: PinnedSlice<T>,
}

impl<T> ArenaSlice<T> {
    pub(crate) fn from_pinned(inner: PinnedSlice<T>) -> Self {
        Self { inner }
    }

    /// Borrow the elements.
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    /// Whether both handles refer to the same arena memory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner.as_ptr(), other.inner.as_ptr())
            && self.as_slice().len() == other.as_slice().len()
    }
}

impl<T: Copy> ArenaSlice<T> {
    /// An empty slice that owns no arena memory.
    pub fn empty() -> Self {
        Self::from_pinned(PinnedSlice::empty())
    }
}

impl<T: Copy> Default for ArenaSlice<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for ArenaSlice<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for ArenaSlice<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Borrow<[T]> for ArenaSlice<T> {
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for ArenaSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for ArenaSlice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for ArenaSlice<T> {}

impl<T: PartialEq> PartialEq<[T]> for ArenaSlice<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Hash> Hash for ArenaSlice<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

/// An immutable string copied into an arena.
#[derive(Clone)]
pub struct ArenaStr {
    inner: PinnedStr,
}

impl ArenaStr {
    pub(crate) fn from_pinned(inner: PinnedStr) -> Self {
        Self { inner }
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Whether both handles refer to the same arena memory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner.as_ptr(), other.inner.as_ptr()) && self.len() == other.len()
    }
}

impl Deref for ArenaStr {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for ArenaStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ArenaStr {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for ArenaStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ArenaStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for ArenaStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ArenaStr {}

impl PartialEq<str> for ArenaStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ArenaStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for ArenaStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}
