//! Storage classes used across the workspace's tests and benchmarks.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use uniq_arena::{Arena, ArenaSlice, ArenaStr};
use uniq_core::MutationError;
use uniq_uniquer::{DeriveKey, DirectKey, KeyedStorage, MutableStorage, Storage};

/// Keyed by a pair of integers.
#[derive(Debug)]
pub struct PairStorage {
    pub first: i32,
    pub second: i32,
}

impl Storage for PairStorage {}

impl KeyedStorage for PairStorage {
    type Key = (i32, i32);

    fn matches_key(&self, key: &(i32, i32)) -> bool {
        (self.first, self.second) == *key
    }

    fn construct(_: &Arena, (first, second): (i32, i32)) -> Self {
        Self { first, second }
    }
}

impl DirectKey for PairStorage {}

/// An unordered set of integers, stored sorted in the arena.
///
/// `derive_key` sorts and deduplicates, so `[3, 1, 3]` and `[1, 3]` share
/// one instance.
#[derive(Debug)]
pub struct ListStorage {
    pub elements: ArenaSlice<u32>,
}

impl Storage for ListStorage {}

impl<A: Into<Vec<u32>>> DeriveKey<A> for ListStorage {
    fn derive_key(args: A) -> Vec<u32> {
        let mut key = args.into();
        key.sort_unstable();
        key.dedup();
        key
    }
}

impl KeyedStorage for ListStorage {
    type Key = Vec<u32>;

    fn matches_key(&self, key: &Vec<u32>) -> bool {
        self.elements.as_slice() == key.as_slice()
    }

    fn construct(arena: &Arena, key: Vec<u32>) -> Self {
        Self {
            elements: arena.alloc_slice_copy(&key),
        }
    }
}

/// A named struct whose body is set after creation.
///
/// The name is the key. The body can be set once; setting the identical
/// body again succeeds, anything else is rejected.
#[derive(Debug)]
pub struct IdentifiedStruct {
    pub name: ArenaStr,
    body: OnceLock<ArenaSlice<u32>>,
}

impl IdentifiedStruct {
    /// The body, if it has been set.
    pub fn body(&self) -> Option<&[u32]> {
        self.body.get().map(ArenaSlice::as_slice)
    }
}

impl Storage for IdentifiedStruct {}

impl KeyedStorage for IdentifiedStruct {
    type Key = String;

    fn matches_key(&self, key: &String) -> bool {
        self.name == key.as_str()
    }

    fn construct(arena: &Arena, key: String) -> Self {
        Self {
            name: arena.alloc_str(&key),
            body: OnceLock::new(),
        }
    }
}

impl DirectKey for IdentifiedStruct {}

/// Mutation for [`IdentifiedStruct`]: set the body.
#[derive(Clone, Debug)]
pub struct SetBody(pub Vec<u32>);

impl MutableStorage for IdentifiedStruct {
    type Mutation = SetBody;

    fn mutate(&self, arena: &Arena, SetBody(fields): SetBody) -> Result<(), MutationError> {
        if let Some(existing) = self.body.get() {
            return if existing.as_slice() == fields.as_slice() {
                Ok(())
            } else {
                Err(MutationError::Finalized)
            };
        }
        let fields = arena.alloc_slice_copy(&fields);
        match self.body.set(fields) {
            Ok(()) => Ok(()),
            Err(_) => Err(MutationError::Finalized),
        }
    }
}

/// Kind-only storage with no key.
#[derive(Debug, Default)]
pub struct UnitStorage;

impl Storage for UnitStorage {}

/// Shared record of storage lifecycle events.
#[derive(Debug, Default)]
pub struct Tally {
    constructs: AtomicUsize,
    cleanups: AtomicUsize,
}

impl Tally {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn constructs(&self) -> usize {
        self.constructs.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

/// Key for [`CountingStorage`]. Only `id` takes part in identity.
#[derive(Clone, Debug)]
pub struct CountingKey {
    pub id: u64,
    pub tally: Arc<Tally>,
}

impl Hash for CountingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<(u64, &Arc<Tally>)> for CountingKey {
    fn from((id, tally): (u64, &Arc<Tally>)) -> Self {
        Self {
            id,
            tally: Arc::clone(tally),
        }
    }
}

/// Counts constructions and cleanups in its key's [`Tally`].
#[derive(Debug)]
pub struct CountingStorage {
    pub id: u64,
    tally: Arc<Tally>,
}

impl Storage for CountingStorage {
    fn cleanup(&self) {
        self.tally.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

impl KeyedStorage for CountingStorage {
    type Key = CountingKey;

    fn matches_key(&self, key: &CountingKey) -> bool {
        self.id == key.id
    }

    fn construct(_: &Arena, key: CountingKey) -> Self {
        key.tally.constructs.fetch_add(1, Ordering::SeqCst);
        Self {
            id: key.id,
            tally: key.tally,
        }
    }
}

impl DirectKey for CountingStorage {}

/// Keyed by an integer, with every key hashing to zero.
#[derive(Debug)]
pub struct CollidingStorage {
    pub value: u64,
}

impl Storage for CollidingStorage {}

impl KeyedStorage for CollidingStorage {
    type Key = u64;

    fn hash_key(_: &u64) -> u64 {
        0
    }

    fn matches_key(&self, key: &u64) -> bool {
        self.value == *key
    }

    fn construct(_: &Arena, value: u64) -> Self {
        Self { value }
    }
}

impl DirectKey for CollidingStorage {}

/// A versioned symbol, keyed by an owned `(name, version)` pair.
///
/// Looked up with borrowed `(&str, u32)` arguments, which do not convert
/// into the key by themselves.
#[derive(Debug)]
pub struct QualifiedName {
    pub name: ArenaStr,
    pub version: u32,
}

impl Storage for QualifiedName {}

impl KeyedStorage for QualifiedName {
    type Key = (String, u32);

    fn matches_key(&self, (name, version): &(String, u32)) -> bool {
        self.name == name.as_str() && self.version == *version
    }

    fn construct(arena: &Arena, (name, version): (String, u32)) -> Self {
        Self {
            name: arena.alloc_str(&name),
            version,
        }
    }
}

impl<'a> DeriveKey<(&'a str, u32)> for QualifiedName {
    fn derive_key((name, version): (&'a str, u32)) -> (String, u32) {
        (name.to_owned(), version)
    }
}
