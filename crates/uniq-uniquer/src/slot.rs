//! Type-erased instance slots and the per-tag instance table.
//!
//! A registry entry serves exactly one storage type, but entries live in
//! one heterogeneous map, so instances are stored as erased pointers. The
//! first typed access binds the table to its storage type; every later
//! access checks the binding before any pointer is cast back. All `unsafe`
//! in this crate is confined to this module.

#![allow(unsafe_code)]

use std::any::{type_name, TypeId};
use std::hash::BuildHasherDefault;
use std::marker::PhantomData;
use std::ptr::NonNull;

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use uniq_arena::Arena;
use uniq_core::{Kind, StorageTag};

use crate::storage::{Storage, Uniqued};

type FxBuild = BuildHasherDefault<FxHasher>;

/// Erased pointer to an arena-resident `Uniqued<S>`.
#[derive(Clone, Copy)]
struct Slot {
    ptr: NonNull<()>,
}

// SAFETY: slots only point at `Uniqued<S>` with `S: Storage`, which is
// `Send + Sync`, and only ever hand out shared references.
unsafe impl Send for Slot {}
// SAFETY: see above.
unsafe impl Sync for Slot {}

impl Slot {
    fn new<S: Storage>(instance: &Uniqued<S>) -> Self {
        Self {
            ptr: NonNull::from(instance).cast(),
        }
    }
}

/// Instances of one storage tag.
///
/// Keyed instances are bucketed by their combined `(kind, key)` hash;
/// kind-only instances sit in a per-kind singleton map.
#[derive(Default)]
pub(crate) struct SlotTable {
    bound: Option<(TypeId, &'static str)>,
    buckets: IndexMap<u64, SmallVec<[Slot; 1]>, FxBuild>,
    singletons: IndexMap<Kind, Slot, FxBuild>,
    keyed: usize,
}

impl SlotTable {
    /// Number of live instances, keyed and kind-only.
    pub(crate) fn len(&self) -> usize {
        self.keyed + self.singletons.len()
    }

    /// Bind this table to `S`, or check an existing binding.
    ///
    /// # Panics
    ///
    /// Panics if the table is already bound to a different storage type.
    #[track_caller]
    pub(crate) fn bind<S: Storage>(&mut self, tag: StorageTag) -> TypedTable<'_, S> {
        let requested = (TypeId::of::<S>(), type_name::<S>());
        match self.bound {
            None => {
                tracing::debug!(tag = %tag, storage = requested.1, "bound storage type");
                self.bound = Some(requested);
            }
            Some((id, name)) => assert!(
                id == requested.0,
                "storage tag {tag} is bound to `{name}`, not `{}`",
                requested.1
            ),
        }
        TypedTable {
            table: self,
            _storage: PhantomData,
        }
    }
}

/// A [`SlotTable`] whose storage type has been checked to be `S`.
///
/// Every slot in the table points into the arena owned by the same
/// uniquer; callers pass that arena so returned references are tied to
/// its lifetime.
pub(crate) struct TypedTable<'t, S> {
    table: &'t mut SlotTable,
    _storage: PhantomData<fn() -> S>,
}

impl<S: Storage> TypedTable<'_, S> {
    fn resolve<'a>(slot: Slot, _arena: &'a Arena) -> &'a Uniqued<S> {
        // SAFETY: the table is bound to `S`, so every slot was created from
        // a `&Uniqued<S>` allocated in the uniquer's arena. Arena memory is
        // never released while the arena is borrowed for `'a`.
        unsafe { slot.ptr.cast::<Uniqued<S>>().as_ref() }
    }

    /// Find a keyed instance in bucket `hash` accepted by `is_match`.
    pub(crate) fn find<'a>(
        &self,
        arena: &'a Arena,
        hash: u64,
        mut is_match: impl FnMut(&Uniqued<S>) -> bool,
    ) -> Option<&'a Uniqued<S>> {
        self.table
            .buckets
            .get(&hash)?
            .iter()
            .map(|&slot| Self::resolve(slot, arena))
            .find(|&instance| is_match(instance))
    }

    /// Insert a freshly constructed keyed instance.
    pub(crate) fn insert(&mut self, hash: u64, instance: &Uniqued<S>) {
        self.table
            .buckets
            .entry(hash)
            .or_default()
            .push(Slot::new(instance));
        self.table.keyed += 1;
    }

    /// Remove and return the keyed instance accepted by `is_match`.
    pub(crate) fn remove<'a>(
        &mut self,
        arena: &'a Arena,
        hash: u64,
        mut is_match: impl FnMut(&Uniqued<S>) -> bool,
    ) -> Option<&'a Uniqued<S>> {
        let bucket = self.table.buckets.get_mut(&hash)?;
        let index = bucket
            .iter()
            .position(|&slot| is_match(Self::resolve(slot, arena)))?;
        let slot = bucket.swap_remove(index);
        if bucket.is_empty() {
            self.table.buckets.swap_remove(&hash);
        }
        self.table.keyed -= 1;
        Some(Self::resolve(slot, arena))
    }

    /// Whether `instance` is live in this table, keyed or kind-only.
    pub(crate) fn contains(&self, instance: &Uniqued<S>) -> bool {
        let target = Slot::new(instance).ptr;
        self.table
            .buckets
            .values()
            .flatten()
            .chain(self.table.singletons.values())
            .any(|slot| slot.ptr == target)
    }

    /// The kind-only instance for `kind`, if constructed.
    pub(crate) fn singleton<'a>(&self, arena: &'a Arena, kind: Kind) -> Option<&'a Uniqued<S>> {
        self.table
            .singletons
            .get(&kind)
            .map(|&slot| Self::resolve(slot, arena))
    }

    /// Record the kind-only instance for its kind.
    pub(crate) fn insert_singleton(&mut self, instance: &Uniqued<S>) {
        let previous = self
            .table
            .singletons
            .insert(instance.kind(), Slot::new(instance));
        debug_assert!(previous.is_none(), "singleton constructed twice");
    }
}
