//! End-to-end uniquing behaviour over the fixture storages.

use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use uniq_core::{Kind, MutationError, StorageTag};
use uniq_test_utils::{
    uniquer_with_tags, CollidingStorage, CountingStorage, IdentifiedStruct, ListStorage,
    PairStorage, QualifiedName, SetBody, Tally, UnitStorage,
};
use uniq_uniquer::{StorageUniquer, Uniqued};

#[test]
fn pair_key_lifecycle() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let kind = Kind(1);

    let p1 = u.get::<PairStorage, _>(tag, kind, (2, 3));
    let again = u.get::<PairStorage, _>(tag, kind, (2, 3));
    assert!(Uniqued::ptr_eq(p1, again));
    assert_eq!((p1.first, p1.second), (2, 3));

    let p2 = u.get::<PairStorage, _>(tag, kind, (2, 4));
    assert!(!Uniqued::ptr_eq(p1, p2));
    assert_eq!(u.instance_count(tag), 2);

    u.erase::<PairStorage, _>(tag, kind, (2, 3));
    assert_eq!(u.instance_count(tag), 1);

    let p3 = u.get::<PairStorage, _>(tag, kind, (2, 3));
    assert!(!Uniqued::ptr_eq(p1, p3));
    assert!(Uniqued::ptr_eq(p2, u.get::<PairStorage, _>(tag, kind, (2, 4))));
    // The erased instance is still readable.
    assert_eq!(p1.second, 3);
}

#[test]
fn canonicalised_keys_share_instance() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let a = u.get::<ListStorage, _>(tag, Kind(0), vec![3u32, 1, 2, 1]);
    let b = u.get::<ListStorage, _>(tag, Kind(0), vec![1u32, 2, 3]);
    assert!(Uniqued::ptr_eq(a, b));
    assert_eq!(a.elements.as_slice(), &[1, 2, 3]);
}

#[test]
fn borrowed_arguments_reach_owned_keys() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let a = u.get::<QualifiedName, _>(tag, Kind(0), ("core", 3u32));
    let name = String::from("core");
    let b = u.get::<QualifiedName, _>(tag, Kind(0), (name.as_str(), 3u32));
    assert!(Uniqued::ptr_eq(a, b));
    assert_eq!(a.name, "core");
    assert_eq!(a.version, 3);

    let next = u.get::<QualifiedName, _>(tag, Kind(0), ("core", 4u32));
    assert!(!Uniqued::ptr_eq(a, next));

    u.erase::<QualifiedName, _>(tag, Kind(0), ("core", 3u32));
    assert_eq!(u.instance_count(tag), 1);
    let fresh = u.get::<QualifiedName, _>(tag, Kind(0), ("core", 3u32));
    assert!(!Uniqued::ptr_eq(a, fresh));
}

#[test]
fn hash_collisions_keep_keys_distinct() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let instances: Vec<_> = (0..16u64)
        .map(|v| u.get::<CollidingStorage, _>(tag, Kind(0), v))
        .collect();
    for (v, instance) in instances.iter().enumerate() {
        assert_eq!(instance.value, v as u64);
        let again = u.get::<CollidingStorage, _>(tag, Kind(0), v as u64);
        assert!(Uniqued::ptr_eq(instance, again));
    }
    u.erase::<CollidingStorage, _>(tag, Kind(0), 7u64);
    assert_eq!(u.instance_count(tag), 15);
    let fresh = u.get::<CollidingStorage, _>(tag, Kind(0), 7u64);
    assert!(!Uniqued::ptr_eq(fresh, instances[7]));
    assert!(Uniqued::ptr_eq(
        instances[8],
        u.get::<CollidingStorage, _>(tag, Kind(0), 8u64)
    ));
}

#[test]
fn singleton_per_kind() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let a = u.get_singleton::<UnitStorage>(tag, Kind(0));
    let b = u.get_singleton::<UnitStorage>(tag, Kind(0));
    let c = u.get_singleton::<UnitStorage>(tag, Kind(1));
    assert!(Uniqued::ptr_eq(a, b));
    assert!(!Uniqued::ptr_eq(a, c));
    assert_eq!(c.kind(), Kind(1));
    assert_eq!(u.instance_count(tag), 2);
}

#[test]
fn singleton_init_runs_once() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let mut runs = 0;
    for _ in 0..3 {
        u.get_singleton_with_init::<UnitStorage, _>(tag, Kind(4), |instance| {
            assert_eq!(instance.kind(), Kind(4));
            runs += 1;
        });
    }
    assert_eq!(runs, 1);
}

#[test]
fn mutation_keeps_identity_and_key() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let node = u.get::<IdentifiedStruct, _>(tag, Kind(0), "node".to_owned());
    assert_eq!(node.body(), None);

    u.mutate(tag, node, SetBody(vec![1u32, 2, 3])).unwrap();
    assert_eq!(node.body(), Some(&[1, 2, 3][..]));

    let same = u.get::<IdentifiedStruct, _>(tag, Kind(0), "node".to_owned());
    assert!(Uniqued::ptr_eq(node, same));
    assert_eq!(same.name, "node");
    assert_eq!(same.body(), Some(&[1, 2, 3][..]));

    assert_eq!(
        u.mutate(tag, node, SetBody(vec![9])),
        Err(MutationError::Finalized)
    );
    assert_eq!(node.body(), Some(&[1, 2, 3][..]));

    let stats = u.stats();
    assert_eq!(stats.mutations, 1);
    assert_eq!(stats.mutation_failures, 1);
}

#[test]
fn erase_runs_cleanup_once() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    let tally = Tally::new();

    let first = u.get::<CountingStorage, _>(tag, Kind(0), (1u64, &tally));
    u.get::<CountingStorage, _>(tag, Kind(0), (1u64, &tally));
    assert_eq!(tally.constructs(), 1);

    u.erase::<CountingStorage, _>(tag, Kind(0), (1u64, &tally));
    u.erase::<CountingStorage, _>(tag, Kind(0), (1u64, &tally));
    assert_eq!(tally.cleanups(), 1);
    assert_eq!(u.instance_count(tag), 0);

    let second = u.get::<CountingStorage, _>(tag, Kind(0), (1u64, &tally));
    assert!(!Uniqued::ptr_eq(first, second));
    assert_eq!(tally.constructs(), 2);
}

#[test]
fn erase_of_absent_key_is_noop() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    u.erase::<PairStorage, _>(tag, Kind(0), (0, 0));
    let p = u.get::<PairStorage, _>(tag, Kind(0), (0, 0));
    u.erase::<PairStorage, _>(tag, Kind(1), (0, 0));
    assert!(Uniqued::ptr_eq(p, u.get::<PairStorage, _>(tag, Kind(0), (0, 0))));
    assert_eq!(u.stats().erased, 0);
}

#[test]
fn tags_are_independent() {
    let (u, [pairs, more_pairs]) = uniquer_with_tags::<2>();
    let a = u.get::<PairStorage, _>(pairs, Kind(0), (1, 1));
    let b = u.get::<PairStorage, _>(more_pairs, Kind(0), (1, 1));
    assert!(!Uniqued::ptr_eq(a, b));
    u.erase::<PairStorage, _>(pairs, Kind(0), (1, 1));
    assert_eq!(u.instance_count(pairs), 0);
    assert_eq!(u.instance_count(more_pairs), 1);
}

#[test]
fn concurrent_gets_construct_once() {
    const THREADS: usize = 8;
    let (u, [tag]) = uniquer_with_tags::<1>();
    let tally = Tally::new();
    let barrier = Barrier::new(THREADS);

    let addresses: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let instance = u.get::<CountingStorage, _>(tag, Kind(0), (42u64, &tally));
                    instance as *const Uniqued<CountingStorage> as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(tally.constructs(), 1);
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn concurrent_mixed_workload() {
    let (u, [pairs, units]) = uniquer_with_tags::<2>();
    let barrier = Barrier::new(4);

    thread::scope(|s| {
        for t in 0..4 {
            let u = &u;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                for i in 0..200 {
                    let p = u.get::<PairStorage, _>(pairs, Kind(0), (i % 50, t));
                    assert_eq!((p.first, p.second), (i % 50, t));
                    u.get_singleton::<UnitStorage>(units, Kind((i % 3) as u32));
                }
            });
        }
    });

    assert_eq!(u.instance_count(pairs), 200);
    assert_eq!(u.instance_count(units), 3);
}

#[test]
fn concurrent_mutations_have_one_winner() {
    const THREADS: usize = 8;
    let (u, [tag]) = uniquer_with_tags::<1>();
    let node = u.get::<IdentifiedStruct, _>(tag, Kind(0), "node".to_owned());
    let barrier = Barrier::new(THREADS);

    let results: Vec<Result<(), MutationError>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS as u32)
            .map(|i| {
                let (u, barrier) = (&u, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    u.mutate(tag, node, SetBody(vec![i]))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == MutationError::Finalized));
    let body = node.body().unwrap();
    assert_eq!(body.len(), 1);
    assert!(Uniqued::ptr_eq(
        node,
        u.get::<IdentifiedStruct, _>(tag, Kind(0), "node".to_owned())
    ));

    let stats = u.stats();
    assert_eq!(stats.mutations, 1);
    assert_eq!(stats.mutation_failures, THREADS as u64 - 1);
}

#[test]
fn racing_get_and_erase_balance_cleanups() {
    const THREADS: usize = 4;
    let (u, [tag]) = uniquer_with_tags::<1>();
    let tally = Tally::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            let (u, tally, barrier) = (&u, &tally, &barrier);
            s.spawn(move || {
                barrier.wait();
                for _ in 0..500 {
                    let instance = u.get::<CountingStorage, _>(tag, Kind(0), (9u64, tally));
                    assert_eq!(instance.id, 9);
                    u.erase::<CountingStorage, _>(tag, Kind(0), (9u64, tally));
                }
            });
        }
    });

    assert_eq!(u.instance_count(tag), 0);
    assert!(tally.constructs() >= 1);
    assert_eq!(tally.constructs(), tally.cleanups());
    assert_eq!(u.stats().erased as usize, tally.cleanups());
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "not live under storage tag")]
fn mutate_rejects_instance_of_another_tag() {
    let (u, [home, other]) = uniquer_with_tags::<2>();
    let node = u.get::<IdentifiedStruct, _>(home, Kind(0), "node".to_owned());
    u.get::<IdentifiedStruct, _>(other, Kind(0), "node".to_owned());
    let _ = u.mutate(other, node, SetBody(vec![1]));
}

#[test]
fn uniquer_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StorageUniquer>();

    let mut u = StorageUniquer::new();
    let tag = StorageTag::next();
    u.register_storage_type(tag);
    let u = Arc::new(u);
    let remote = Arc::clone(&u);
    let value = thread::spawn(move || remote.get::<PairStorage, _>(tag, Kind(0), (5, 6)).first)
        .join()
        .unwrap();
    assert_eq!(value, 5);
    assert_eq!(u.instance_count(tag), 1);
}

#[test]
#[should_panic(expected = "used before register_storage_type")]
fn unregistered_tag_panics() {
    let u = StorageUniquer::new();
    u.get_singleton::<UnitStorage>(StorageTag::next(), Kind(0));
}

#[test]
#[should_panic(expected = "is bound to")]
fn tag_type_mismatch_panics() {
    let (u, [tag]) = uniquer_with_tags::<1>();
    u.get::<PairStorage, _>(tag, Kind(0), (1, 2));
    u.erase::<CollidingStorage, _>(tag, Kind(0), 1u64);
}

#[test]
#[should_panic(expected = "multithreading is disabled")]
fn reentrant_construct_detected_without_threading() {
    let (mut u, [tag]) = uniquer_with_tags::<1>();
    u.disable_multithreading();
    u.get_with_init::<PairStorage, _, _>(tag, Kind(0), (1, 1), |_| {
        u.get::<PairStorage, _>(tag, Kind(0), (2, 2));
    });
}

#[test]
#[should_panic(expected = "multithreading is disabled")]
fn instance_count_inside_init_detected_without_threading() {
    let (mut u, [tag]) = uniquer_with_tags::<1>();
    u.disable_multithreading();
    u.get_with_init::<PairStorage, _, _>(tag, Kind(0), (1, 1), |_| {
        u.instance_count(tag);
    });
}

proptest! {
    #[test]
    fn equal_keys_share_instances(keys in prop::collection::vec((0i32..8, 0i32..8, 0u32..3), 1..64)) {
        let (u, [tag]) = uniquer_with_tags::<1>();
        let mut seen: Vec<((i32, i32, u32), *const Uniqued<PairStorage>)> = Vec::new();
        for &(a, b, k) in &keys {
            let ptr = u.get::<PairStorage, _>(tag, Kind(k), (a, b)) as *const _;
            for &(key, other) in &seen {
                prop_assert_eq!(key == (a, b, k), other == ptr);
            }
            seen.push(((a, b, k), ptr));
        }
        let mut distinct: Vec<_> = keys.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(u.instance_count(tag), distinct.len());
    }
}
