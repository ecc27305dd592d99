//! Thread-safe hash-consing of storage instances.
//!
//! A [`StorageUniquer`] hands out exactly one canonical instance per
//! `(tag, kind, key)`, so structurally equal values share one address and
//! can be compared by reference. Instances are allocated in an arena owned
//! by the uniquer and live until it drops.
//!
//! # Architecture
//!
//! ```text
//! StorageUniquer
//! ├── IndexMap<StorageTag, RegistryEntry>   (fixed after set-up)
//! │   └── Mutex<SlotTable>                  (one lock per tag)
//! │       ├── hash → [instance]             (keyed storages)
//! │       └── kind → instance               (kind-only storages)
//! ├── Arena                                 (own lock, shared by all tags)
//! └── Counters                              (relaxed atomics)
//! ```
//!
//! Storage classes describe themselves through the traits in [`storage`].
//!
//! # Example
//!
//! ```rust
//! use uniq_arena::Arena;
//! use uniq_core::{Kind, StorageTag};
//! use uniq_uniquer::{DirectKey, KeyedStorage, Storage, StorageUniquer};
//!
//! struct IntegerType {
//!     width: u32,
//! }
//!
//! impl Storage for IntegerType {}
//!
//! impl KeyedStorage for IntegerType {
//!     type Key = u32;
//!
//!     fn matches_key(&self, key: &u32) -> bool {
//!         self.width == *key
//!     }
//!
//!     fn construct(_: &Arena, width: u32) -> Self {
//!         Self { width }
//!     }
//! }
//!
//! impl DirectKey for IntegerType {}
//!
//! let tag = StorageTag::next();
//! let mut uniquer = StorageUniquer::new();
//! uniquer.register_storage_type(tag);
//!
//! let i32_a = uniquer.get::<IntegerType, _>(tag, Kind(0), 32u32);
//! let i32_b = uniquer.get::<IntegerType, _>(tag, Kind(0), 32u32);
//! assert!(std::ptr::eq(i32_a, i32_b));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
mod entry;
pub mod metrics;
mod slot;
pub mod storage;
pub mod uniquer;

pub use config::{ConfigError, UniquerConfig};
pub use metrics::UniquerStats;
pub use storage::{
    DeriveKey, DirectKey, KeyedStorage, MutableStorage, SingletonStorage, Storage, Uniqued,
};
pub use uniquer::StorageUniquer;
