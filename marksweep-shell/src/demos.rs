//!
//! Scripted walkthroughs of the collector, each narrating one scenario.
//!

use std::collections::{HashSet, VecDeque};
use std::io::Write;

use anyhow::{bail, ensure, Error};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use marksweep_gc::{CycleStats, GcHeap, ObjectId};

use crate::render;

type Heap = GcHeap<Option<&'static str>>;

/// Names and descriptions of the available demos, in the order `all` runs them.
pub const DEMOS: &[(&str, &str)] = &[
    ("basic", "basic garbage collection"),
    ("circular", "circular references"),
    ("multiple-roots", "multiple root objects"),
    ("progressive", "progressive cleanup as references and roots go away"),
    ("web", "web server handling requests"),
    ("phases", "mark and sweep phases, one at a time"),
    ("random", "random object graph, checked against a breadth-first search"),
];

const RULE: &str = "======================================================================";

/// Runs the demo with the given name (or all of them, for `all`).
pub fn run(name: &str, seed: u64, out: &mut dyn Write) -> Result<(), Error> {
    match name {
        "basic" => basic(out),
        "circular" => circular(out),
        "multiple-roots" => multiple_roots(out),
        "progressive" => progressive(out),
        "web" => web(out),
        "phases" => phases(out),
        "random" => random(seed, out),
        "all" => {
            for (name, _) in DEMOS {
                run(name, seed, out)?;
            }
            writeln!(out, "All demos completed!")?;
            Ok(())
        }
        _ => bail!("unknown demo '{}' (try --list-demos)", name),
    }
}

fn banner(out: &mut dyn Write, title: &str, scenario: &str) -> Result<(), Error> {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "DEMO: {}", title)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Scenario: {}", scenario)?;
    writeln!(out)?;
    Ok(())
}

fn collect(out: &mut dyn Write, heap: &mut Heap) -> Result<CycleStats, Error> {
    let stats = heap.collect();
    writeln!(
        out,
        "GC complete: {} objects freed, {} objects remaining",
        stats.collected_objects, stats.final_objects,
    )?;
    write!(out, "{}", heap.dump())?;
    Ok(stats)
}

fn basic(out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Basic Garbage Collection",
        "creating objects with some becoming unreachable",
    )?;
    let mut heap = Heap::new();

    let main = heap.allocate("Main", Some("main object"));
    let helper = heap.allocate("Helper", Some("helper"));
    heap.allocate("Orphan", Some("will be garbage"));
    let child = heap.allocate("Child", Some("child object"));

    heap.add_reference(main, helper)?;
    heap.add_reference(helper, child)?;
    heap.add_root(main)?;

    write!(out, "{}", heap.dump())?;
    let stats = collect(out, &mut heap)?;

    ensure!(stats.collected_objects == 1, "expected only the orphan to be collected");
    Ok(())
}

fn circular(out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Circular References",
        "objects with circular references (A -> B -> C -> A)",
    )?;
    let mut heap = Heap::new();

    let a = heap.allocate("Node-A", None);
    let b = heap.allocate("Node-B", None);
    let c = heap.allocate("Node-C", None);
    heap.add_reference(a, b)?;
    heap.add_reference(b, c)?;
    heap.add_reference(c, a)?;

    let root = heap.allocate("Root", None);
    heap.add_reference(root, a)?;
    heap.add_root(root)?;

    write!(out, "{}", heap.dump())?;
    writeln!(out, "The cycle is reachable from the root, so everything is kept.")?;
    let stats = collect(out, &mut heap)?;
    ensure!(stats.collected_objects == 0, "the rooted cycle should survive");

    writeln!(out, "Removing the root's reference to the cycle...")?;
    heap.remove_reference(root, a)?;
    let stats = collect(out, &mut heap)?;
    ensure!(stats.collected_objects == 3, "the whole cycle should be collected");

    Ok(())
}

fn multiple_roots(out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Multiple Root Objects",
        "multiple root objects, like multiple stack frames",
    )?;
    let mut heap = Heap::new();

    let frame_1 = heap.allocate("StackFrame-1", None);
    let frame_2 = heap.allocate("StackFrame-2", None);
    heap.add_root(frame_1)?;
    heap.add_root(frame_2)?;

    let obj_1a = heap.allocate("Frame1-ObjA", None);
    let obj_1b = heap.allocate("Frame1-ObjB", None);
    heap.add_reference(frame_1, obj_1a)?;
    heap.add_reference(obj_1a, obj_1b)?;

    let obj_2a = heap.allocate("Frame2-ObjA", None);
    let obj_2b = heap.allocate("Frame2-ObjB", None);
    heap.add_reference(frame_2, obj_2a)?;
    heap.add_reference(obj_2a, obj_2b)?;

    heap.allocate("Orphan-1", None);
    heap.allocate("Orphan-2", None);

    write!(out, "{}", heap.dump())?;
    writeln!(out, "Two separate object trees hang off two roots: only the orphans go.")?;
    let stats = collect(out, &mut heap)?;

    ensure!(stats.collected_objects == 2, "expected the two orphans to be collected");
    Ok(())
}

fn progressive(out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Progressive Cleanup",
        "gradually removing references and roots, and watching garbage accumulate",
    )?;
    let mut heap = Heap::new();

    let root = heap.allocate("Root", None);
    heap.add_root(root)?;

    let branch_1 = heap.allocate("Branch-1", None);
    let branch_2 = heap.allocate("Branch-2", None);
    heap.add_reference(root, branch_1)?;
    heap.add_reference(root, branch_2)?;

    for name in &["Leaf-1A", "Leaf-1B"] {
        let leaf = heap.allocate(*name, None);
        heap.add_reference(branch_1, leaf)?;
    }
    for name in &["Leaf-2A", "Leaf-2B"] {
        let leaf = heap.allocate(*name, None);
        heap.add_reference(branch_2, leaf)?;
    }

    write!(out, "{}", heap.dump())?;

    writeln!(out, "1. Every object is reachable:")?;
    let first = collect(out, &mut heap)?;

    writeln!(out, "2. Removing the reference to Branch-1:")?;
    heap.remove_reference(root, branch_1)?;
    let second = collect(out, &mut heap)?;

    writeln!(out, "3. Removing the reference to Branch-2:")?;
    heap.remove_reference(root, branch_2)?;
    let third = collect(out, &mut heap)?;

    writeln!(out, "4. Removing the root itself:")?;
    heap.remove_root(root)?;
    let fourth = collect(out, &mut heap)?;

    let collected = [first, second, third, fourth]
        .iter()
        .map(|it| it.collected_objects)
        .collect::<Vec<_>>();
    ensure!(collected == [0, 3, 3, 1], "unexpected cleanup sequence: {:?}", collected);

    writeln!(out, "Final stats: {:?}", heap.stats())?;
    Ok(())
}

fn web(out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Web Server Requests",
        "simulating HTTP request processing with temporary objects",
    )?;
    let mut heap = Heap::new();

    let app = heap.allocate("WebApplication", Some("port=8080"));
    heap.add_root(app)?;
    let db_pool = heap.allocate("DatabasePool", Some("connections=10"));
    heap.add_reference(app, db_pool)?;
    writeln!(out, "Web server started with a database pool.")?;

    let mut requests = Vec::new();
    for (idx, (path, user)) in [("/api/users", "user_id=123"), ("/api/posts", "user_id=456")]
        .iter()
        .enumerate()
    {
        writeln!(out, "Processing request {} ({})...", idx + 1, path)?;
        let request = heap.allocate(format!("Request-{}", idx + 1), Some(*path));
        heap.add_root(request)?;

        let session = heap.allocate(format!("Session-{}", idx + 1), Some(*user));
        let response = heap.allocate(format!("Response-{}", idx + 1), Some("status=200"));
        heap.add_reference(request, session)?;
        heap.add_reference(request, response)?;
        heap.add_reference(request, db_pool)?;
        requests.push(request);
    }
    write!(out, "{}", heap.dump())?;

    for (idx, request) in requests.into_iter().enumerate() {
        writeln!(out, "Request {} completed, cleaning up...", idx + 1)?;
        heap.remove_root(request)?;
        let stats = collect(out, &mut heap)?;
        ensure!(
            stats.collected_objects == 3,
            "request {} should free its request, session and response",
            idx + 1,
        );
    }

    writeln!(out, "The application and its database pool remain, still rooted.")?;
    writeln!(out, "Total GC stats: {:?}", heap.stats())?;
    Ok(())
}

fn phases(out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Mark and Sweep Phases",
        "running each phase separately and looking at the graph in between",
    )?;
    let mut heap = Heap::new();

    let root = heap.allocate("Root", None);
    heap.add_root(root)?;
    let reachable_1 = heap.allocate("Reachable-1", None);
    let reachable_2 = heap.allocate("Reachable-2", None);
    heap.allocate("Garbage-1", None);
    heap.allocate("Garbage-2", None);
    heap.add_reference(root, reachable_1)?;
    heap.add_reference(reachable_1, reachable_2)?;

    write!(out, "{}", render::ascii(&heap, "Before Collection"))?;

    let marked = heap.mark();
    write!(out, "{}", render::ascii(&heap, "After Mark Phase"))?;

    let tombstones = heap.sweep();
    write!(out, "{}", render::ascii(&heap, "After Sweep Phase"))?;
    for tombstone in tombstones.iter() {
        writeln!(out, "  collected: {}", tombstone)?;
    }

    ensure!(marked == 3 && tombstones.len() == 2, "unexpected phase results");
    Ok(())
}

/// Computes the objects reachable from the roots with a breadth-first search.
fn reachable(heap: &Heap) -> HashSet<ObjectId> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<ObjectId> = heap.roots().map(|it| it.id()).collect();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let object = heap.handle(id).and_then(|gc| heap.get(gc).ok());
        if let Some(object) = object {
            queue.extend(object.references().iter().copied());
        }
    }

    seen
}

fn random(seed: u64, out: &mut dyn Write) -> Result<(), Error> {
    banner(
        out,
        "Random Object Graph",
        "a random graph, collected, then compared with an independent reachability search",
    )?;
    writeln!(out, "Seed: {}", seed)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut heap = Heap::new();

    let count = rng.gen_range(50..200);
    let handles: Vec<_> = (0..count)
        .map(|idx| heap.allocate(format!("node-{}", idx), None))
        .collect();
    for from in handles.iter() {
        for _ in 0..rng.gen_range(0..4) {
            let to = handles[rng.gen_range(0..handles.len())];
            heap.add_reference(*from, to)?;
        }
        if rng.gen_bool(0.05) {
            heap.add_root(*from)?;
        }
    }

    let expected = reachable(&heap);
    let stats = heap.collect();
    let survivors: HashSet<ObjectId> = heap.objects().map(|it| it.id()).collect();

    writeln!(
        out,
        "{} objects, {} roots: {} marked, {} collected",
        stats.initial_objects, stats.roots, stats.marked_objects, stats.collected_objects,
    )?;
    ensure!(
        survivors == expected,
        "the collector kept {} objects, but {} are reachable",
        survivors.len(),
        expected.len(),
    );
    writeln!(out, "Survivors match the breadth-first search exactly.")?;
    Ok(())
}
