use marksweep_gc::{GcError, GcHeap, GcParams, MarkState};

#[test]
fn allocate_and_roots() {
    let mut heap = GcHeap::new();
    let object = heap.allocate("root", Some("data"));

    assert!(heap.contains(object));
    assert_eq!(heap.get(object).unwrap().name(), "root");
    assert_eq!(heap.get(object).unwrap().data(), &Some("data"));

    assert_eq!(heap.add_root(object), Ok(true));
    assert_eq!(heap.add_root(object), Ok(false));
    assert!(heap.is_root(object));
    assert_eq!(heap.roots().collect::<Vec<_>>(), vec![object]);

    assert_eq!(heap.remove_root(object), Ok(true));
    assert_eq!(heap.remove_root(object), Ok(false));
    assert!(!heap.is_root(object));
}

#[test]
fn ids_increase_in_allocation_order() {
    let mut heap = GcHeap::new();
    let first = heap.allocate("a", ());
    let second = heap.allocate("b", ());
    heap.collect();
    let third = heap.allocate("c", ());

    assert!(first.id() < second.id());
    assert!(second.id() < third.id());
}

#[test]
fn duplicate_references_are_ignored() {
    let mut heap = GcHeap::new();
    let a = heap.allocate("a", ());
    let b = heap.allocate("b", ());

    assert_eq!(heap.add_reference(a, b), Ok(true));
    assert_eq!(heap.add_reference(a, b), Ok(false));
    assert_eq!(heap.get(a).unwrap().references(), &[b.id()]);

    assert_eq!(heap.remove_reference(a, b), Ok(true));
    assert_eq!(heap.remove_reference(a, b), Ok(false));
    assert!(heap.get(a).unwrap().references().is_empty());
}

#[test]
fn scenario_chain_with_orphan() {
    let mut heap = GcHeap::new();
    let a = heap.allocate("A", ());
    let b = heap.allocate("B", ());
    let c = heap.allocate("C", ());
    let d = heap.allocate("D", ());
    heap.add_reference(a, b).unwrap();
    heap.add_reference(b, c).unwrap();
    heap.add_root(a).unwrap();

    let stats = heap.collect();

    assert_eq!(stats.initial_objects, 4);
    assert_eq!(stats.marked_objects, 3);
    assert_eq!(stats.collected_objects, 1);
    assert_eq!(stats.final_objects, 3);
    assert_eq!(stats.roots, 1);
    assert!(heap.contains(a) && heap.contains(b) && heap.contains(c));
    assert!(!heap.contains(d));
}

#[test]
fn scenario_disjoint_subtrees() {
    let mut heap = GcHeap::new();
    let left = heap.allocate("left", ());
    let left_child = heap.allocate("left-child", ());
    let right = heap.allocate("right", ());
    let right_child = heap.allocate("right-child", ());
    let right_grandchild = heap.allocate("right-grandchild", ());
    let orphan_1 = heap.allocate("orphan-1", ());
    let orphan_2 = heap.allocate("orphan-2", ());

    heap.add_reference(left, left_child).unwrap();
    heap.add_reference(right, right_child).unwrap();
    heap.add_reference(right_child, right_grandchild).unwrap();
    heap.add_root(left).unwrap();
    heap.add_root(right).unwrap();

    let (stats, tombstones) = heap.collect_with_tombstones();

    assert_eq!(stats.collected_objects, 2);
    assert_eq!(stats.final_objects, 5);

    let mut collected: Vec<_> = tombstones.iter().map(|it| it.id()).collect();
    collected.sort();
    assert_eq!(collected, vec![orphan_1.id(), orphan_2.id()]);
    assert!(tombstones
        .iter()
        .all(|it| it.state() == MarkState::Collected));

    for gc in [left, left_child, right, right_child, right_grandchild] {
        assert!(heap.contains(gc));
    }
    assert_eq!(heap.get(right_child).unwrap().references(), &[right_grandchild.id()]);
}

#[test]
fn recollection_without_mutation_is_empty() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    let child = heap.allocate("child", ());
    heap.allocate("garbage", ());
    heap.add_reference(root, child).unwrap();
    heap.add_root(root).unwrap();

    assert_eq!(heap.collect().collected_objects, 1);
    let second = heap.collect();
    assert_eq!(second.collected_objects, 0);
    assert_eq!(second.initial_objects, second.final_objects);
}

#[test]
fn stats_and_history_accumulate() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    let branch = heap.allocate("branch", ());
    let leaf = heap.allocate("leaf", ());
    heap.add_reference(root, branch).unwrap();
    heap.add_reference(branch, leaf).unwrap();
    heap.add_root(root).unwrap();

    heap.collect();
    heap.remove_reference(root, branch).unwrap();
    heap.collect();
    heap.remove_root(root).unwrap();
    heap.collect();

    let collected: Vec<_> = heap
        .history()
        .iter()
        .map(|it| it.collected_objects)
        .collect();
    assert_eq!(collected, vec![0, 2, 1]);

    let stats = heap.stats();
    assert_eq!(stats.total_objects, 0);
    assert_eq!(stats.root_objects, 0);
    assert_eq!(stats.total_collected, 3);
    assert_eq!(stats.collection_cycles, 3);

    for cycle in heap.history() {
        assert_eq!(cycle.marked_objects + cycle.collected_objects, cycle.initial_objects);
        assert_eq!(cycle.final_objects, cycle.initial_objects - cycle.collected_objects);
    }
}

#[test]
fn collected_handles_are_unknown() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    let garbage = heap.allocate("garbage", ());
    heap.add_root(root).unwrap();
    heap.collect();

    assert_eq!(heap.add_root(garbage), Err(GcError::UnknownObject(garbage.id())));
    assert_eq!(
        heap.add_reference(root, garbage),
        Err(GcError::UnknownObject(garbage.id()))
    );
    assert_eq!(
        heap.add_reference(garbage, root),
        Err(GcError::UnknownObject(garbage.id()))
    );
    assert!(heap.get(garbage).is_err());
    assert_eq!(heap.stats().root_objects, 1);
}

#[test]
fn foreign_handles_are_rejected() {
    let mut heap: GcHeap<()> = GcHeap::new();
    let mut other: GcHeap<()> = GcHeap::new();
    let local = heap.allocate("local", ());
    let foreign = other.allocate("foreign", ());

    assert_eq!(heap.add_root(foreign), Err(GcError::ForeignHandle(foreign.id())));
    assert_eq!(heap.remove_root(foreign), Err(GcError::ForeignHandle(foreign.id())));
    assert_eq!(
        heap.add_reference(local, foreign),
        Err(GcError::ForeignHandle(foreign.id()))
    );
    assert!(!heap.contains(foreign));
    assert!(!heap.is_root(foreign));
    assert_eq!(heap.stats().root_objects, 0);
}

#[test]
fn clear_starts_fresh() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    heap.allocate("garbage", ());
    heap.add_root(root).unwrap();
    heap.collect();

    heap.clear();

    let stats = heap.stats();
    assert_eq!(stats.total_objects, 0);
    assert_eq!(stats.root_objects, 0);
    assert_eq!(stats.total_collected, 0);
    assert_eq!(stats.collection_cycles, 0);
    assert_eq!(heap.add_root(root), Err(GcError::UnknownObject(root.id())));

    let fresh = heap.allocate("fresh", ());
    assert!(fresh.id() > root.id());
}

#[test]
fn sweep_without_mark_keeps_roots() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    heap.add_root(root).unwrap();
    let garbage = heap.allocate("garbage", ());

    let tombstones = heap.sweep();

    assert_eq!(tombstones.len(), 1);
    assert_eq!(tombstones[0].id(), garbage.id());
    assert_eq!(tombstones[0].state(), MarkState::Collected);
    assert!(heap.contains(root));
    assert_eq!(heap.roots().collect::<Vec<_>>(), vec![root]);
    assert_eq!(heap.stats().total_collected, 1);
}

#[test]
fn mutations_between_mark_and_sweep() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    heap.add_root(root).unwrap();
    assert_eq!(heap.mark(), 1);

    let fresh = heap.allocate("fresh", ());
    heap.add_reference(root, fresh).unwrap();
    let tombstones = heap.sweep();

    assert!(tombstones.is_empty());
    assert!(heap.contains(fresh));
    for object in heap.objects() {
        for id in object.references() {
            assert!(heap.handle(*id).is_some());
        }
    }

    // a root pinned after the mark phase survives as well.
    heap.mark();
    let late = heap.allocate("late", ());
    heap.add_root(late).unwrap();
    assert!(heap.sweep().is_empty());
    assert!(heap.contains(late));
}

#[test]
fn references_to_swept_objects_can_be_removed() {
    let mut heap = GcHeap::new();
    let root = heap.allocate("root", ());
    let child = heap.allocate("child", ());
    heap.add_root(root).unwrap();
    heap.add_reference(root, child).unwrap();
    heap.collect();

    heap.remove_reference(root, child).unwrap();
    heap.collect();

    assert!(!heap.contains(child));
    assert_eq!(heap.remove_reference(root, child), Ok(false));
    assert_eq!(
        heap.add_reference(root, child),
        Err(GcError::UnknownObject(child.id()))
    );
}

#[test]
fn payload_can_be_updated() {
    let mut heap = GcHeap::new();
    let object = heap.allocate("counter", 0);

    *heap.get_mut(object).unwrap().data_mut() += 5;

    assert_eq!(*heap.get(object).unwrap().data(), 5);
}

#[test]
fn threshold_triggers_collection() {
    let mut heap = GcHeap::with_params(GcParams {
        threshold: 4,
        used_space_ratio: 0.5,
    });
    let root = heap.allocate("root", ());
    heap.add_root(root).unwrap();

    for idx in 0..3 {
        let child = heap.allocate(format!("child-{}", idx), ());
        heap.add_reference(root, child).unwrap();
    }
    assert_eq!(heap.maybe_collect(), None);

    heap.allocate("garbage", ());
    let stats = heap.maybe_collect().unwrap();

    assert_eq!(stats.collected_objects, 1);
    assert_eq!(stats.final_objects, 4);
    // 4 survivors exceed 4 * 0.5, so the threshold grows to 4 / 0.5.
    assert_eq!(heap.params().threshold, 8);
    assert_eq!(heap.stats().collection_cycles, 1);
}

#[test]
fn out_of_range_ratio_falls_back_to_default() {
    for ratio in [0.0, -1.0, 1.5, f64::NAN] {
        let mut heap = GcHeap::with_params(GcParams {
            threshold: 1,
            used_space_ratio: ratio,
        });
        assert_eq!(heap.params().used_space_ratio, 0.7);

        let root = heap.allocate("root", ());
        heap.add_root(root).unwrap();
        let child = heap.allocate("child", ());
        heap.add_reference(root, child).unwrap();
        heap.maybe_collect().unwrap();

        // 2 survivors exceed 1 * 0.7, so the threshold grows to 2 / 0.7.
        assert_eq!(heap.params().threshold, 2);
    }
}

#[test]
fn iter_pairs_handles_with_objects() {
    let mut heap = GcHeap::new();
    let a = heap.allocate("a", 1);
    let b = heap.allocate("b", 2);
    heap.add_root(a).unwrap();
    heap.collect();

    let pairs: Vec<_> = heap
        .iter()
        .map(|(gc, object)| (gc, object.name().to_string(), *object.data()))
        .collect();

    assert_eq!(pairs, vec![(a, "a".to_string(), 1)]);
    assert!(!heap.contains(b));
}
