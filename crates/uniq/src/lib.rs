//! Uniq: thread-safe hash-consing of arena-allocated storage instances.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the uniq sub-crates. For most users, adding `uniq` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use uniq::prelude::*;
//!
//! // A tuple type: uniqued by its element list, stored in the arena.
//! struct TupleType {
//!     elements: ArenaSlice<u32>,
//! }
//!
//! impl Storage for TupleType {}
//!
//! impl KeyedStorage for TupleType {
//!     type Key = Vec<u32>;
//!
//!     fn matches_key(&self, key: &Vec<u32>) -> bool {
//!         self.elements.as_slice() == key.as_slice()
//!     }
//!
//!     fn construct(arena: &Arena, key: Vec<u32>) -> Self {
//!         Self { elements: arena.alloc_slice_copy(&key) }
//!     }
//! }
//!
//! impl DirectKey for TupleType {}
//!
//! // A kind-only storage: one instance per kind.
//! #[derive(Default)]
//! struct NoneType;
//! impl Storage for NoneType {}
//!
//! let tuples = StorageTag::next();
//! let nones = StorageTag::next();
//! let mut uniquer = StorageUniquer::new();
//! uniquer.register_storage_type(tuples);
//! uniquer.register_storage_type(nones);
//!
//! let a = uniquer.get::<TupleType, _>(tuples, Kind(0), vec![1u32, 2]);
//! let b = uniquer.get::<TupleType, _>(tuples, Kind(0), vec![1u32, 2]);
//! assert!(Uniqued::ptr_eq(a, b));
//!
//! let none = uniquer.get_singleton::<NoneType>(nones, Kind(7));
//! assert_eq!(none.kind(), Kind(7));
//! assert_eq!(uniquer.stats().live_instances, 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `uniq-core` | Tags, kinds, hashing helpers, mutation errors |
//! | [`arena`] | `uniq-arena` | Segmented arena and payload handles |
//! | [`uniquer`] | `uniq-uniquer` | Storage traits and the uniquer itself |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Tags, kinds, hashing helpers and mutation errors (`uniq-core`).
pub use uniq_core as types;

/// Segmented bump arena and its payload handles (`uniq-arena`).
///
/// Storage classes copy variable-length data here in
/// [`uniquer::KeyedStorage::construct`].
pub use uniq_arena as arena;

/// Storage traits and the [`uniquer::StorageUniquer`] (`uniq-uniquer`).
pub use uniq_uniquer as uniquer;

/// Common imports for typical uniq usage.
///
/// ```rust
/// use uniq::prelude::*;
/// ```
pub mod prelude {
    // Identity and hashing
    pub use uniq_core::{hash_combine, structural_hash, Kind, MutationError, StorageTag};

    // Arena
    pub use uniq_arena::{Arena, ArenaSlice, ArenaStr};

    // Uniquer
    pub use uniq_uniquer::{
        DeriveKey, DirectKey, KeyedStorage, MutableStorage, SingletonStorage, Storage,
        StorageUniquer, Uniqued, UniquerConfig, UniquerStats,
    };
}
