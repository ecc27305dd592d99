//! The storage uniquer: registration, lookup-or-construct, mutation and
//! erasure of canonical storage instances.

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use tracing::{debug, trace};
use uniq_arena::Arena;
use uniq_core::{hash_combine, Kind, MutationError, StorageTag};

use crate::config::{ConfigError, UniquerConfig};
use crate::entry::RegistryEntry;
use crate::metrics::{Counters, UniquerStats};
use crate::storage::{DeriveKey, KeyedStorage, MutableStorage, SingletonStorage, Uniqued};

/// Canonicalises storage instances across any number of threads.
///
/// For a registered tag, every `(kind, key)` pair maps to at most one live
/// instance, so callers compare uniqued values by reference identity.
/// Instances live in the uniquer's [`Arena`] and are handed out as
/// `&Uniqued<S>` borrowed from the uniquer; they stay valid until the
/// uniquer drops, even after [`erase`](Self::erase).
///
/// Registration and threading changes take `&mut self`: they happen during
/// set-up, before the uniquer is shared. Everything else takes `&self`.
///
/// # Panics
///
/// Using a tag that was never registered, or using one tag with two
/// different storage types, is a caller bug and panics.
pub struct StorageUniquer {
    entries: IndexMap<StorageTag, RegistryEntry, BuildHasherDefault<FxHasher>>,
    arena: Arena,
    threaded: bool,
    counters: Counters,
}

impl StorageUniquer {
    /// Create a multithreaded uniquer with default arena sizing.
    pub fn new() -> Self {
        Self::from_parts(true, Arena::default())
    }

    /// Create a uniquer from an explicit configuration.
    pub fn with_config(config: UniquerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = Arena::new(config.arena).map_err(ConfigError::Arena)?;
        Ok(Self::from_parts(config.multithreaded, arena))
    }

    fn from_parts(threaded: bool, arena: Arena) -> Self {
        Self {
            entries: IndexMap::default(),
            arena,
            threaded,
            counters: Counters::default(),
        }
    }

    /// Enable or disable blocking entry locks.
    ///
    /// With multithreading disabled, entry locks are only probed, never
    /// waited on, and contention panics. Taking `&mut self` guarantees no
    /// operation is in flight while the mode changes.
    pub fn set_multithreading(&mut self, enabled: bool) {
        if self.threaded != enabled {
            debug!(enabled, "uniquer multithreading changed");
        }
        self.threaded = enabled;
    }

    /// Shorthand for `set_multithreading(false)`.
    pub fn disable_multithreading(&mut self) {
        self.set_multithreading(false);
    }

    /// Whether entry locks block.
    pub fn is_multithreaded(&self) -> bool {
        self.threaded
    }

    /// Register a storage tag. Registering the same tag again is a no-op.
    pub fn register_storage_type(&mut self, tag: StorageTag) {
        if self.entries.contains_key(&tag) {
            return;
        }
        self.entries.insert(tag, RegistryEntry::new(tag));
        debug!(tag = %tag, registered = self.entries.len(), "registered storage type");
    }

    /// Whether `tag` has been registered.
    pub fn is_registered(&self, tag: StorageTag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// The arena that owns every instance and payload.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[track_caller]
    fn entry(&self, tag: StorageTag) -> &RegistryEntry {
        match self.entries.get(&tag) {
            Some(entry) => entry,
            None => panic!("storage tag {tag} used before register_storage_type"),
        }
    }

    /// Get the canonical instance of `S` for `kind` and the key derived
    /// from `args`, constructing it on first request.
    ///
    /// `construct` runs under the lock of `tag`; neither it nor `init` may
    /// call back into the uniquer for the same tag.
    #[track_caller]
    pub fn get<S, A>(&self, tag: StorageTag, kind: Kind, args: A) -> &Uniqued<S>
    where
        S: KeyedStorage + DeriveKey<A>,
    {
        self.get_keyed(tag, kind, args, |_: &Uniqued<S>| {})
    }

    /// Like [`get`](Self::get), running `init` on a newly constructed
    /// instance before any other caller can observe it.
    ///
    /// `init` is not called when the instance already exists.
    #[track_caller]
    pub fn get_with_init<S, A, F>(&self, tag: StorageTag, kind: Kind, args: A, init: F) -> &Uniqued<S>
    where
        S: KeyedStorage + DeriveKey<A>,
        F: FnOnce(&Uniqued<S>),
    {
        self.get_keyed(tag, kind, args, init)
    }

    #[track_caller]
    fn get_keyed<S, A, F>(&self, tag: StorageTag, kind: Kind, args: A, init: F) -> &Uniqued<S>
    where
        S: KeyedStorage + DeriveKey<A>,
        F: FnOnce(&Uniqued<S>),
    {
        let key = <S as DeriveKey<A>>::derive_key(args);
        let hash = hash_combine(kind, S::hash_key(&key));

        let entry = self.entry(tag);
        let mut guard = entry.acquire(self.threaded);
        let mut table = guard.bind::<S>(tag);

        let existing = table.find(&self.arena, hash, |instance| {
            instance.kind() == kind && instance.matches_key(&key)
        });
        if let Some(instance) = existing {
            Counters::bump(&self.counters.lookup_hits);
            return instance;
        }

        let instance = self
            .arena
            .alloc(Uniqued::new(kind, S::construct(&self.arena, key)));
        init(instance);
        table.insert(hash, instance);
        Counters::bump(&self.counters.constructed);
        trace!(tag = %tag, kind = %kind, "constructed uniqued instance");
        instance
    }

    /// Get the kind-only instance of `S` for `kind`, constructing it on
    /// first request.
    #[track_caller]
    pub fn get_singleton<S>(&self, tag: StorageTag, kind: Kind) -> &Uniqued<S>
    where
        S: SingletonStorage,
    {
        self.get_singleton_with_init(tag, kind, |_: &Uniqued<S>| {})
    }

    /// Like [`get_singleton`](Self::get_singleton), running `init` once on
    /// the newly constructed instance.
    #[track_caller]
    pub fn get_singleton_with_init<S, F>(&self, tag: StorageTag, kind: Kind, init: F) -> &Uniqued<S>
    where
        S: SingletonStorage,
        F: FnOnce(&Uniqued<S>),
    {
        let entry = self.entry(tag);
        let mut guard = entry.acquire(self.threaded);
        let mut table = guard.bind::<S>(tag);

        if let Some(instance) = table.singleton(&self.arena, kind) {
            Counters::bump(&self.counters.lookup_hits);
            return instance;
        }

        let instance = self.arena.alloc(Uniqued::new(kind, S::construct(&self.arena)));
        init(instance);
        table.insert_singleton(instance);
        Counters::bump(&self.counters.constructed);
        trace!(tag = %tag, kind = %kind, "constructed kind-only instance");
        instance
    }

    /// Apply `mutation` to the mutable component of `instance`.
    ///
    /// Serialised with every other operation on `tag`. The instance keeps
    /// its address and its key; a rejected mutation leaves it unchanged.
    ///
    /// `instance` must be a live instance of `tag`. Debug builds check
    /// this and panic otherwise.
    #[track_caller]
    pub fn mutate<S>(
        &self,
        tag: StorageTag,
        instance: &Uniqued<S>,
        mutation: S::Mutation,
    ) -> Result<(), MutationError>
    where
        S: MutableStorage,
    {
        let entry = self.entry(tag);
        let mut guard = entry.acquire(self.threaded);
        let table = guard.bind::<S>(tag);
        debug_assert!(
            table.contains(instance),
            "instance passed to mutate is not live under storage tag {tag}"
        );

        let result = instance.storage().mutate(&self.arena, mutation);
        match &result {
            Ok(()) => Counters::bump(&self.counters.mutations),
            Err(e) => {
                Counters::bump(&self.counters.mutation_failures);
                trace!(tag = %tag, kind = %instance.kind(), error = %e, "mutation rejected");
            }
        }
        result
    }

    /// Erase the instance of `S` for `kind` and the key derived from
    /// `args`, running its cleanup hook.
    ///
    /// Erasing an absent key does nothing. Memory stays in the arena;
    /// references obtained earlier remain readable but are no longer
    /// canonical, and a later `get` constructs a fresh instance.
    #[track_caller]
    pub fn erase<S, A>(&self, tag: StorageTag, kind: Kind, args: A)
    where
        S: KeyedStorage + DeriveKey<A>,
    {
        let key = <S as DeriveKey<A>>::derive_key(args);
        let hash = hash_combine(kind, S::hash_key(&key));

        let entry = self.entry(tag);
        let mut guard = entry.acquire(self.threaded);
        let mut table = guard.bind::<S>(tag);

        let removed = table.remove(&self.arena, hash, |instance| {
            instance.kind() == kind && instance.matches_key(&key)
        });
        if let Some(instance) = removed {
            instance.cleanup();
            Counters::bump(&self.counters.erased);
            debug!(tag = %tag, kind = %kind, "erased uniqued instance");
        }
    }

    /// Live instances of `tag`, keyed and kind-only.
    ///
    /// # Panics
    ///
    /// Takes the lock of `tag`, so it must not be called from a `construct`
    /// or `init` running for that tag: with multithreading enabled that
    /// deadlocks, without it the call panics. Also panics for an
    /// unregistered tag.
    #[track_caller]
    pub fn instance_count(&self, tag: StorageTag) -> usize {
        self.entry(tag).acquire(self.threaded).len()
    }

    /// Snapshot of activity counters and arena usage.
    ///
    /// # Panics
    ///
    /// Takes every tag's lock in turn, so it must not be called from any
    /// `construct` or `init` hook: with multithreading enabled that
    /// deadlocks, without it the call panics.
    pub fn stats(&self) -> UniquerStats {
        UniquerStats {
            registered_tags: self.entries.len(),
            live_instances: self
                .entries
                .values()
                .map(|entry| entry.acquire(self.threaded).len())
                .sum(),
            constructed: Counters::read(&self.counters.constructed),
            lookup_hits: Counters::read(&self.counters.lookup_hits),
            erased: Counters::read(&self.counters.erased),
            mutations: Counters::read(&self.counters.mutations),
            mutation_failures: Counters::read(&self.counters.mutation_failures),
            arena_allocated_bytes: self.arena.allocated_bytes(),
            arena_memory_bytes: self.arena.memory_bytes(),
        }
    }
}

impl Default for StorageUniquer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DirectKey, Storage};
    use uniq_arena::ArenaConfig;

    struct Int {
        value: i64,
    }

    impl Storage for Int {}

    impl KeyedStorage for Int {
        type Key = i64;

        fn matches_key(&self, key: &i64) -> bool {
            self.value == *key
        }

        fn construct(_: &Arena, key: i64) -> Self {
            Self { value: key }
        }
    }

    impl DirectKey for Int {}

    #[derive(Default)]
    struct Unit;
    impl Storage for Unit {}

    struct Counter {
        start: u64,
    }

    impl Storage for Counter {}

    impl SingletonStorage for Counter {
        fn construct(arena: &Arena) -> Self {
            Self {
                start: arena.allocated_bytes() as u64,
            }
        }
    }

    fn uniquer_with(tag: StorageTag) -> StorageUniquer {
        let mut u = StorageUniquer::new();
        u.register_storage_type(tag);
        u
    }

    #[test]
    fn registration_is_idempotent() {
        let tag = StorageTag(1);
        let mut u = uniquer_with(tag);
        let first = u.get::<Int, _>(tag, Kind(0), 5i64) as *const Uniqued<Int>;
        u.register_storage_type(tag);
        assert!(u.is_registered(tag));
        assert_eq!(u.instance_count(tag), 1);
        let again = u.get::<Int, _>(tag, Kind(0), 5i64) as *const Uniqued<Int>;
        assert_eq!(first, again);
    }

    #[test]
    fn kind_separates_equal_keys() {
        let tag = StorageTag(1);
        let u = uniquer_with(tag);
        let a = u.get::<Int, _>(tag, Kind(0), 5i64);
        let b = u.get::<Int, _>(tag, Kind(1), 5i64);
        assert!(!Uniqued::ptr_eq(a, b));
        assert_eq!(a.kind(), Kind(0));
        assert_eq!(b.kind(), Kind(1));
        assert_eq!(b.value, 5);
    }

    #[test]
    fn init_runs_only_on_construction() {
        let tag = StorageTag(1);
        let u = uniquer_with(tag);
        let mut calls = 0;
        u.get_with_init::<Int, _, _>(tag, Kind(0), 9i64, |i| {
            assert_eq!(i.value, 9);
            calls += 1;
        });
        u.get_with_init::<Int, _, _>(tag, Kind(0), 9i64, |_| calls += 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn custom_singleton_construct_sees_arena() {
        let tag = StorageTag(1);
        let u = uniquer_with(tag);
        u.arena().copy_bytes(b"warm");
        let c = u.get_singleton::<Counter>(tag, Kind(0));
        assert_eq!(c.start, 4);
        assert!(Uniqued::ptr_eq(c, u.get_singleton::<Counter>(tag, Kind(0))));
    }

    #[test]
    fn stats_track_operations() {
        let tag = StorageTag(1);
        let unit = StorageTag(2);
        let mut u = uniquer_with(tag);
        u.register_storage_type(unit);
        u.get::<Int, _>(tag, Kind(0), 1i64);
        u.get::<Int, _>(tag, Kind(0), 1i64);
        u.get::<Int, _>(tag, Kind(0), 2i64);
        u.get_singleton::<Unit>(unit, Kind(0));
        u.erase::<Int, _>(tag, Kind(0), 2i64);

        let stats = u.stats();
        assert_eq!(stats.registered_tags, 2);
        assert_eq!(stats.live_instances, 2);
        assert_eq!(stats.constructed, 3);
        assert_eq!(stats.lookup_hits, 1);
        assert_eq!(stats.erased, 1);
        assert!(stats.arena_allocated_bytes > 0);
        assert!(stats.arena_memory_bytes >= stats.arena_allocated_bytes);
    }

    #[test]
    fn single_threaded_mode_round_trips() {
        let tag = StorageTag(1);
        let mut u = uniquer_with(tag);
        u.disable_multithreading();
        assert!(!u.is_multithreaded());
        let a = u.get::<Int, _>(tag, Kind(0), 3i64);
        let b = u.get::<Int, _>(tag, Kind(0), 3i64);
        assert!(Uniqued::ptr_eq(a, b));
    }

    #[test]
    fn with_config_applies_settings() {
        let u = StorageUniquer::with_config(UniquerConfig {
            multithreaded: false,
            arena: ArenaConfig::new(1024),
        })
        .unwrap();
        assert!(!u.is_multithreaded());
        assert!(StorageUniquer::with_config(UniquerConfig {
            multithreaded: true,
            arena: ArenaConfig::new(1000),
        })
        .is_err());
    }

    #[test]
    #[should_panic(expected = "used before register_storage_type")]
    fn unregistered_tag_panics() {
        let u = StorageUniquer::new();
        u.get::<Int, _>(StorageTag(99), Kind(0), 1i64);
    }

    #[test]
    #[should_panic(expected = "is bound to")]
    fn tag_reuse_across_types_panics() {
        let tag = StorageTag(1);
        let u = uniquer_with(tag);
        u.get::<Int, _>(tag, Kind(0), 1i64);
        u.get_singleton::<Unit>(tag, Kind(0));
    }
}
