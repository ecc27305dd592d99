//! Benchmark profiles for the uniq storage uniquer.
//!
//! - [`pair_keys`]: deterministic key stream for keyed lookups
//! - [`populated_uniquer`]: a uniquer pre-filled with pair instances

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uniq_core::{Kind, StorageTag};
use uniq_test_utils::PairStorage;
use uniq_uniquer::StorageUniquer;

/// `count` distinct pair keys, shuffled deterministically by `seed`.
pub fn pair_keys(count: usize, seed: u64) -> Vec<(i32, i32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<(i32, i32)> = (0..count as i32).map(|i| (i / 64, i % 64)).collect();
    keys.shuffle(&mut rng);
    keys
}

/// A uniquer with one registered tag holding every key in `keys`.
pub fn populated_uniquer(keys: &[(i32, i32)]) -> (StorageUniquer, StorageTag) {
    let mut uniquer = StorageUniquer::new();
    let tag = StorageTag::next();
    uniquer.register_storage_type(tag);
    for &key in keys {
        uniquer.get::<PairStorage, _>(tag, Kind(0), key);
    }
    (uniquer, tag)
}
