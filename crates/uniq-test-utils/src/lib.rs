//! Test utilities and storage fixtures for uniq development.
//!
//! Each fixture exercises one shape of storage class:
//!
//! - [`PairStorage`]: a plain keyed storage over two integers;
//! - [`ListStorage`]: a keyed storage that canonicalises its key and keeps
//!   its payload in the arena;
//! - [`IdentifiedStruct`]: keyed by name with a mutable, set-once body;
//! - [`UnitStorage`]: a kind-only storage;
//! - [`CountingStorage`]: records constructions and cleanups in a shared
//!   [`Tally`];
//! - [`CollidingStorage`]: hashes every key to the same bucket;
//! - [`QualifiedName`]: derives an owned key from borrowed arguments.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    CollidingStorage, CountingKey, CountingStorage, IdentifiedStruct, ListStorage, PairStorage,
    QualifiedName, SetBody, Tally, UnitStorage,
};

use uniq_core::StorageTag;
use uniq_uniquer::StorageUniquer;

/// A fresh uniquer with a fresh tag registered for each entry of `N`.
pub fn uniquer_with_tags<const N: usize>() -> (StorageUniquer, [StorageTag; N]) {
    let mut uniquer = StorageUniquer::new();
    let tags = std::array::from_fn(|_| {
        let tag = StorageTag::next();
        uniquer.register_storage_type(tag);
        tag
    });
    (uniquer, tags)
}
