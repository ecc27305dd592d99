//! The contract every storage class implements to be uniqued.
//!
//! A storage class is a plain Rust type. It opts into uniquing by
//! implementing [`Storage`] plus one of:
//!
//! - [`KeyedStorage`] for parametric storages identified by a key;
//! - [`SingletonStorage`] for kind-only storages, uniqued solely by their
//!   [`Kind`]. Every `Storage + Default` type gets it for free.
//!
//! Storages with a mutable component additionally implement
//! [`MutableStorage`]. Instances are shared between threads as soon as
//! they are published, so that component must use interior mutability
//! (`OnceLock`, a lock, or atomics) and must never take part in the key.
//!
//! Keys are built from constructor arguments through [`DeriveKey`].
//! Storages whose arguments convert straight into the key opt into that
//! with the [`DirectKey`] marker; the rest implement `DeriveKey` for each
//! argument shape they accept, borrowed or not. [`KeyedStorage::hash_key`]
//! defaults to a structural hash.

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;

use uniq_arena::Arena;
use uniq_core::{structural_hash, Kind, MutationError};

/// Base contract of every storage class.
pub trait Storage: Send + Sync + 'static {
    /// Release whatever the instance logically owns outside the arena.
    ///
    /// Called exactly once when the instance is erased. Must not try to
    /// free the instance's own arena memory. The default does nothing.
    fn cleanup(&self) {}
}

/// A storage class uniqued by an immutable key.
pub trait KeyedStorage: Storage + Sized {
    /// The immutable identity of an instance within its kind.
    type Key: Hash;

    /// Hash a key. The default is a structural hash of the key value.
    fn hash_key(key: &Self::Key) -> u64 {
        structural_hash(key)
    }

    /// Whether this stored instance is identified by `key`.
    fn matches_key(&self, key: &Self::Key) -> bool;

    /// Build a new instance for `key`.
    ///
    /// Variable-length data should be copied into `arena`. The uniquer
    /// moves the result into the arena and assigns its kind.
    fn construct(arena: &Arena, key: Self::Key) -> Self;
}

/// Builds the key of a [`KeyedStorage`] from constructor arguments `A`.
///
/// Implement this to canonicalise keys (e.g. sort a member list) or to
/// accept arguments that do not convert into the key on their own, such
/// as borrowed strings for an owned key.
pub trait DeriveKey<A>: KeyedStorage {
    /// Derive the key for `args`.
    fn derive_key(args: A) -> Self::Key;
}

/// Marker for storages whose arguments convert straight into the key.
///
/// Implementing it provides `DeriveKey<A>` for every `A: Into<Self::Key>`.
pub trait DirectKey: KeyedStorage {}

impl<S, A> DeriveKey<A> for S
where
    S: DirectKey,
    A: Into<S::Key>,
{
    fn derive_key(args: A) -> S::Key {
        args.into()
    }
}

/// A kind-only storage class: one instance per kind, no key.
pub trait SingletonStorage: Storage + Sized {
    /// Build the instance for a kind on first request.
    fn construct(arena: &Arena) -> Self;
}

impl<S: Storage + Default> SingletonStorage for S {
    fn construct(_: &Arena) -> Self {
        S::default()
    }
}

/// A storage class with a mutable component outside its key.
pub trait MutableStorage: Storage {
    /// Arguments forwarded from [`StorageUniquer::mutate`](crate::StorageUniquer::mutate).
    type Mutation;

    /// Apply a mutation to the non-key component.
    ///
    /// Each call may allocate fresh payload memory from `arena`; memory of
    /// a replaced payload is not reclaimed. Returning an error leaves the
    /// instance unchanged.
    fn mutate(&self, arena: &Arena, mutation: Self::Mutation) -> Result<(), MutationError>;
}

/// An arena-resident, uniqued storage instance.
///
/// The uniquer sets `kind` when it constructs the instance; storage classes
/// cannot change it. Two `&Uniqued<S>` denote the same value exactly when
/// they are the same reference, see [`Uniqued::ptr_eq`].
pub struct Uniqued<S> {
    kind: Kind,
    storage: S,
}

impl<S> Uniqued<S> {
    pub(crate) fn new(kind: Kind, storage: S) -> Self {
        Self { kind, storage }
    }

    /// The kind this instance was created with.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The storage class payload.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        std::ptr::eq(a, b)
    }
}

impl<S> Deref for Uniqued<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.storage
    }
}

impl<S: fmt::Debug> fmt::Debug for Uniqued<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uniqued")
            .field("kind", &self.kind)
            .field("storage", &self.storage)
            .finish()
    }
}
