//! Hashing helpers shared by storage classes and the uniquer.
//!
//! Hashes are computed with [`FxHasher`]: instances are probed far more
//! often than they are created, and keys are small compiler values, so a
//! fast non-cryptographic hash is the right trade.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::id::Kind;

/// Structural hash of any `Hash` value.
///
/// This is the fallback used for storage keys that do not provide their
/// own hashing.
pub fn structural_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Combine a kind discriminator with a key hash.
///
/// The result buckets an instance in its registry entry. Equal
/// `(kind, key_hash)` pairs always produce equal results.
pub fn hash_combine(kind: Kind, key_hash: u64) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u32(kind.0);
    hasher.write_u64(key_hash);
    hasher.finish()
}
