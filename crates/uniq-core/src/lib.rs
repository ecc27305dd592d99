//! Core types for the uniq storage uniquer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the arena and the uniquer: classification
//! tags, kind discriminators, error types, and the hash combination
//! used to bucket uniqued instances.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod hash;
pub mod id;

pub use error::MutationError;
pub use hash::{hash_combine, structural_hash};
pub use id::{Kind, StorageTag};
