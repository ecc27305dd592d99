//! Append-only bump arena for uniqued storage instances.
//!
//! Every uniqued instance and every auxiliary payload (copied strings,
//! arrays, raw byte regions) lives in an [`Arena`]. Nothing is freed
//! individually: memory is reclaimed only when the arena is torn down,
//! which matches compiler workloads where types and attributes live for
//! the whole compilation.
//!
//! # Architecture
//!
//! ```text
//! Arena (owner)
//! ├── Arc<Pool>
//! │   └── Mutex<SegmentList> → Segment[] (bump-allocated raw blocks)
//! └── Mutex<DropList> (destructors run at teardown, reverse order)
//!
//! ArenaSlice<T> / ArenaStr (handles)
//! └── Arc<Pool> (keeps the backing segments alive)
//! ```
//!
//! Segments start at [`ArenaConfig::segment_bytes`] and double every
//! [`ArenaConfig::growth_interval`] segments. Requests that do not fit a
//! fresh segment get a dedicated block of their own.
//!
//! # Safety
//!
//! This crate is the only one in the workspace that allocates raw memory.
//! All `unsafe` code is confined to `raw.rs`; the public API is safe.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod handle;
mod raw;
pub mod segment;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::{ArenaSlice, ArenaStr};
