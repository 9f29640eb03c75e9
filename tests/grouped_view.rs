use std::sync::atomic::{AtomicU64, Ordering};

use sector_ecs::{EntityId, Registry};

#[derive(Clone, Copy, Debug, PartialEq)]
struct A(u64);

#[derive(Clone, Copy, Debug, PartialEq)]
struct B(u32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct C(f32);

/// Five entities, every one carrying `A(i)`, the even ones also `B(2i)`.
fn mixed_registry() -> (Registry, Vec<EntityId>) {
    let mut registry = Registry::new();
    registry.register_group::<(A, B)>().expect("group registration failed");

    let mut ids = Vec::new();
    for i in 0..5u64 {
        let id = registry.take_entity();
        registry.add_component(id, A(i));
        if i % 2 == 0 {
            registry.add_component(id, B(i as u32 * 2));
        }
        ids.push(id);
    }
    (registry, ids)
}

#[test]
fn views_yield_fully_live_sectors_in_index_order() {
    let (registry, ids) = mixed_registry();

    let view = registry.view::<(A, B)>();
    let hits: Vec<(EntityId, u64, u32)> =
        view.iter().map(|(id, (a, b))| (id, a.0, b.0)).collect();

    assert_eq!(hits, vec![(ids[0], 0, 0), (ids[2], 2, 4), (ids[4], 4, 8)]);
}

#[test]
fn subset_views_ignore_missing_siblings() {
    let (registry, _ids) = mixed_registry();

    // only the A bit is tested, so the odd entities show up too
    let all: Vec<u64> = registry.view::<(A,)>().iter().map(|(_, (a,))| a.0).collect();
    assert_eq!(all, vec![0, 1, 2, 3, 4]);
}

#[test]
fn views_are_stable_without_structural_changes() {
    let (registry, _ids) = mixed_registry();
    let view = registry.view::<(A, B)>();

    let first: Vec<EntityId> = view.iter().map(|(id, _)| id).collect();
    let second: Vec<EntityId> = view.iter().map(|(id, _)| id).collect();
    assert_eq!(first, second, "re-iterating an untouched view must repeat itself");

    // a view constructed afresh over the unchanged array walks identically
    let rebuilt: Vec<EntityId> =
        registry.view::<(A, B)>().iter().map(|(id, _)| id).collect();
    assert_eq!(rebuilt, first, "rebuilding a view over an untouched array must repeat it");

    // iterators advanced in lockstep stay equal, and meet again at the end
    let mut left = view.iter();
    let mut right = view.iter();
    assert!(left == right);
    left.next();
    right.next();
    assert!(left == right);
    while left.next().is_some() {}
    while right.next().is_some() {}
    assert!(left == right);
    assert_eq!(left.next(), None, "a finished iterator stays finished");
}

#[test]
fn removal_hides_sectors_from_fresh_views() {
    let (mut registry, ids) = mixed_registry();

    assert!(registry.remove_component::<B>(ids[2]));
    let after_remove: Vec<EntityId> =
        registry.view::<(A, B)>().iter().map(|(id, _)| id).collect();
    assert_eq!(after_remove, vec![ids[0], ids[4]]);

    // the A payload is untouched and the sector keeps its slot
    assert_eq!(registry.get::<A>(ids[2]), Some(&A(2)));
    assert!(!registry.has_component::<B>(ids[2]));
    assert_eq!(registry.container::<A>().unwrap().len(), 5);

    // putting B back restores the original walk
    registry.add_component(ids[2], B(4));
    let restored: Vec<EntityId> =
        registry.view::<(A, B)>().iter().map(|(id, _)| id).collect();
    assert_eq!(restored, vec![ids[0], ids[2], ids[4]]);
    assert_eq!(registry.container::<A>().unwrap().len(), 5);
}

#[test]
fn views_handle_the_empty_and_all_dead_extremes() {
    let mut registry = Registry::new();
    registry.register_group::<(A, B)>().expect("group registration failed");

    // registered but unpopulated
    assert_eq!(registry.view::<(A, B)>().iter().next(), None);
    assert_eq!(registry.view::<(A, B)>().sector_count(), 0);

    // populated, then every B removed: the walk spans all sectors but yields none
    let ids: Vec<EntityId> = (0..3)
        .map(|i| {
            let id = registry.take_entity();
            registry.add_component(id, A(i));
            registry.add_component(id, B(i as u32));
            id
        })
        .collect();
    for &id in &ids {
        registry.remove_component::<B>(id);
    }
    let view = registry.view::<(A, B)>();
    assert_eq!(view.sector_count(), 3);
    assert_eq!(view.iter().count(), 0);
}

#[test]
fn mutation_through_views_is_observable() {
    let (mut registry, ids) = mixed_registry();

    let mut view = registry.view_mut::<(A, B)>();
    for (_, (a, b)) in view.iter_mut() {
        a.0 += 100;
        b.0 += 1;
    }

    assert_eq!(registry.get::<A>(ids[0]), Some(&A(100)));
    assert_eq!(registry.get::<B>(ids[0]), Some(&B(1)));
    assert_eq!(registry.get::<A>(ids[1]), Some(&A(1)), "sectors outside the view keep their payloads");
    assert_eq!(registry.get::<A>(ids[4]), Some(&A(104)));
}

#[test]
fn ranges_and_splits_partition_the_walk() {
    let mut registry = Registry::new();
    registry.register_group::<(A, B)>().expect("group registration failed");
    for i in 0..10u64 {
        let id = registry.take_entity();
        registry.add_component(id, A(i));
        registry.add_component(id, B(i as u32));
    }

    let view = registry.view::<(A, B)>();

    let middle: Vec<u64> = view.range(2..7).iter().map(|(_, (a, _))| a.0).collect();
    assert_eq!(middle, vec![2, 3, 4, 5, 6]);

    let (head, tail) = view.split_at(4);
    assert_eq!(head.sector_count(), 4);
    assert_eq!(tail.sector_count(), 6);
    let stitched: Vec<u64> = head
        .iter()
        .chain(tail.iter())
        .map(|(_, (a, _))| a.0)
        .collect();
    assert_eq!(stitched, (0..10).collect::<Vec<u64>>());
}

#[test]
fn parallel_visits_cover_every_live_sector_once() {
    let mut registry = Registry::new();
    registry.register_group::<(A, B)>().expect("group registration failed");
    for i in 0..1_000u64 {
        let id = registry.take_entity();
        registry.add_component(id, A(i));
        if i % 3 == 0 {
            registry.add_component(id, B(1));
        }
    }

    let visits = AtomicU64::new(0);
    let sum = AtomicU64::new(0);
    registry.view::<(A, B)>().par_for_each(|_, (a, _)| {
        visits.fetch_add(1, Ordering::Relaxed);
        sum.fetch_add(a.0, Ordering::Relaxed);
    });

    let expected: u64 = (0..1_000).filter(|i| i % 3 == 0).sum();
    assert_eq!(visits.load(Ordering::Relaxed), 334);
    assert_eq!(sum.load(Ordering::Relaxed), expected);
}

#[test]
fn parallel_writes_land_like_serial_ones() {
    let mut registry = Registry::new();
    registry.register_group::<(A, B)>().expect("group registration failed");
    let ids: Vec<EntityId> = (0..500u64)
        .map(|i| {
            let id = registry.take_entity();
            registry.add_component(id, A(i));
            registry.add_component(id, B(0));
            id
        })
        .collect();

    registry.view_mut::<(A, B)>().par_for_each(|id, (a, b)| {
        a.0 *= 2;
        b.0 = id.0;
    });

    for (i, &id) in ids.iter().enumerate() {
        assert_eq!(registry.get::<A>(id), Some(&A(i as u64 * 2)));
        assert_eq!(registry.get::<B>(id), Some(&B(id.0)));
    }
}

#[test]
fn owned_collection_matches_the_walk() {
    let (registry, ids) = mixed_registry();

    let owned = registry.snapshot::<(A, B)>();
    assert_eq!(
        owned,
        vec![(ids[0], (A(0), B(0))), (ids[2], (A(2), B(4))), (ids[4], (A(4), B(8)))]
    );
}

#[test]
fn raw_views_expose_headers_and_payloads() {
    let (registry, ids) = mixed_registry();

    let array = registry.container::<A>().unwrap();
    let entry = array.layout().entry_of::<A>().copied().unwrap();
    let raw = registry.raw_view::<(A, B)>();

    let mut seen = Vec::new();
    for sector in &raw {
        assert!(sector.has_all(raw.mask()));
        seen.push((sector.id(), sector.component::<A>(&entry).unwrap().0));
    }
    assert_eq!(seen, vec![(ids[0], 0), (ids[2], 2), (ids[4], 4)]);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "before its component group was registered")]
fn views_over_unregistered_groups_are_rejected_in_debug() {
    let registry = Registry::new();
    let _ = registry.view::<(A, B)>();
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "does not group together")]
fn views_crossing_group_boundaries_are_rejected_in_debug() {
    let mut registry = Registry::new();
    registry.register_group::<(A, C)>().expect("group registration failed");

    // A lives in the (A, C) array, which knows nothing about B
    let _ = registry.view::<(A, B)>();
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "does not group together")]
fn views_repeating_a_member_are_rejected_in_debug() {
    let (mut registry, _ids) = mixed_registry();

    // one A payload per sector cannot back two exclusive references
    let _ = registry.view_mut::<(A, A)>();
}

#[test]
#[cfg(not(debug_assertions))]
fn views_repeating_a_member_are_empty_in_release() {
    let (mut registry, _ids) = mixed_registry();

    let mut doubled = registry.view_mut::<(A, A)>();
    assert_eq!(doubled.sector_count(), 0, "a tuple naming one member twice must not resolve");
    assert_eq!(doubled.iter_mut().count(), 0);

    let shared = registry.view::<(A, A)>();
    assert_eq!(shared.iter().count(), 0);
}
