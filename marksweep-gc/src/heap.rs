use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};

use crate::dump::GraphDump;
use crate::error::{GcError, GcResult};
use crate::gc::{Gc, HeapId};
use crate::object::{ManagedObject, ObjectId};
use crate::stats::{CycleStats, GcStats};
use crate::trace::Tracer;

#[derive(Debug, Clone, PartialEq)]
pub struct GcParams {
    /// Live object count above which [`GcHeap::maybe_collect`] runs a cycle.
    pub threshold: usize,
    /// Fraction of the threshold that may stay live after a triggered cycle before the threshold
    /// is raised. Must lie in `(0, 1]`; anything else is replaced by the default.
    pub used_space_ratio: f64,
}

impl Default for GcParams {
    fn default() -> Self {
        Self {
            threshold: 1024,
            used_space_ratio: 0.7,
        }
    }
}

/// The GC heap itself, which is the storage for all GC-ed objects.
///
/// Objects are kept in allocation order, which is also identity order.
#[derive(Debug)]
pub struct GcHeap<T> {
    id: HeapId,
    params: GcParams,
    objects: IndexMap<ObjectId, ManagedObject<T>>,
    roots: IndexSet<ObjectId>,
    collected_count: usize,
    history: Vec<CycleStats>,
    time_spent: Duration,
    tracer: Tracer,
    /// Whether the marks still describe the current graph, i.e. nothing changed since `mark`.
    marks_valid: bool,
}

impl<T> Default for GcHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GcHeap<T> {
    /// Creates a new empty GC heap, with the default parameters.
    pub fn new() -> Self {
        Self::with_params(GcParams::default())
    }

    /// Creates a new empty GC heap, with the specified parameters.
    pub fn with_params(mut params: GcParams) -> Self {
        let ratio = params.used_space_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            let default = GcParams::default().used_space_ratio;
            log::warn!("invalid used space ratio {}, using {} instead", ratio, default);
            params.used_space_ratio = default;
        }
        Self {
            id: HeapId::next(),
            params,
            objects: IndexMap::new(),
            roots: IndexSet::new(),
            collected_count: 0,
            history: Vec::new(),
            time_spent: Duration::ZERO,
            tracer: Tracer::new(),
            marks_valid: false,
        }
    }

    /// Returns a reference to the GC's parameters.
    pub fn params(&self) -> &GcParams {
        &self.params
    }

    /// Returns the GC's aggregate statistics.
    pub fn stats(&self) -> GcStats {
        GcStats {
            total_objects: self.objects.len(),
            root_objects: self.roots.len(),
            total_collected: self.collected_count,
            collection_cycles: self.history.len(),
            total_time_spent: self.time_spent,
        }
    }

    /// Returns the statistics of every completed cycle, oldest first.
    pub fn history(&self) -> &[CycleStats] {
        &self.history
    }

    /// Allocates an object on the GC heap, returning its handle.
    pub fn allocate(&mut self, name: impl Into<String>, data: T) -> Gc {
        let object = ManagedObject::new(name.into(), data);
        let id = object.id();
        log::debug!("allocated: {}", object);
        self.objects.insert(id, object);
        self.marks_valid = false;
        Gc { heap: self.id, id }
    }

    /// Adds a reference from `from` to `to`.
    ///
    /// Returns `false` if that reference already existed.
    pub fn add_reference(&mut self, from: Gc, to: Gc) -> GcResult<bool> {
        let target = self.resolve(to)?;
        let object = self.object_mut(from)?;
        let added = object.add_reference(target);
        if added {
            self.marks_valid = false;
            log::debug!("added reference: {} -> {}", from.id, target);
        }
        Ok(added)
    }

    /// Removes the reference from `from` to `to`.
    ///
    /// Returns `false` if there was no such reference. The target need not be live.
    pub fn remove_reference(&mut self, from: Gc, to: Gc) -> GcResult<bool> {
        let target = self.owned(to)?;
        let object = self.object_mut(from)?;
        let removed = object.remove_reference(target);
        if removed {
            self.marks_valid = false;
            log::debug!("removed reference: {} -> {}", from.id, target);
        }
        Ok(removed)
    }

    /// Pins a live object as a root.
    ///
    /// Returns `false` if it already was one.
    pub fn add_root(&mut self, gc: Gc) -> GcResult<bool> {
        let id = self.resolve(gc)?;
        let added = self.roots.insert(id);
        if added {
            self.marks_valid = false;
            log::debug!("added root: {}", id);
        }
        Ok(added)
    }

    /// Unpins an object from the root set.
    ///
    /// Returns `false` if it was not a root.
    pub fn remove_root(&mut self, gc: Gc) -> GcResult<bool> {
        let id = self.owned(gc)?;
        let removed = self.roots.shift_remove(&id);
        if removed {
            self.marks_valid = false;
            log::debug!("removed root: {}", id);
        }
        Ok(removed)
    }

    /// Returns whether the object behind this handle is live in this heap.
    pub fn contains(&self, gc: Gc) -> bool {
        self.resolve(gc).is_ok()
    }

    /// Returns whether the object behind this handle is a root of this heap.
    pub fn is_root(&self, gc: Gc) -> bool {
        gc.heap == self.id && self.roots.contains(&gc.id)
    }

    /// Returns the object behind this handle.
    pub fn get(&self, gc: Gc) -> GcResult<&ManagedObject<T>> {
        let id = self.resolve(gc)?;
        self.objects.get(&id).ok_or(GcError::UnknownObject(id))
    }

    /// Returns the object behind this handle, mutably.
    ///
    /// Only the payload can be changed this way: references go through the heap,
    /// and the mark state is the collector's business.
    pub fn get_mut(&mut self, gc: Gc) -> GcResult<&mut ManagedObject<T>> {
        self.object_mut(gc)
    }

    /// Returns a handle to the live object with the given identity, if any.
    pub fn handle(&self, id: ObjectId) -> Option<Gc> {
        if self.objects.contains_key(&id) {
            Some(Gc { heap: self.id, id })
        } else {
            None
        }
    }

    /// Iterates over every live object, in allocation order.
    pub fn objects(&self) -> impl Iterator<Item = &ManagedObject<T>> + '_ {
        self.objects.values()
    }

    /// Iterates over handles to every live object, in allocation order.
    pub fn handles(&self) -> impl Iterator<Item = Gc> + '_ {
        let heap = self.id;
        self.objects.keys().map(move |id| Gc { heap, id: *id })
    }

    /// Iterates over every live object along with its handle, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Gc, &ManagedObject<T>)> + '_ {
        let heap = self.id;
        self.objects
            .iter()
            .map(move |(id, object)| (Gc { heap, id: *id }, object))
    }

    /// Iterates over handles to every root, in the order they were pinned.
    pub fn roots(&self) -> impl Iterator<Item = Gc> + '_ {
        let heap = self.id;
        self.roots.iter().map(move |id| Gc { heap, id: *id })
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns whether the heap holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns a printable view of the object graph.
    pub fn dump(&self) -> GraphDump<'_, T> {
        GraphDump::new(self)
    }

    /// Performs the mark phase: clears every mark, then marks everything reachable from the roots.
    ///
    /// Returns the number of objects marked.
    pub fn mark(&mut self) -> usize {
        let marked = self.tracer.trace(&mut self.objects, &self.roots);
        self.marks_valid = true;
        log::debug!("mark phase complete: {} objects marked as reachable", marked);
        marked
    }

    /// Performs the sweep phase: evicts every object left unmarked by the latest mark phase.
    ///
    /// If the heap was mutated since that mark phase (or none ran yet), the graph is marked again
    /// first. The evicted objects are returned as tombstones, for diagnostics only.
    pub fn sweep(&mut self) -> Vec<ManagedObject<T>> {
        if !self.marks_valid {
            log::debug!("marks are out of date, marking again before sweeping");
            self.mark();
        }

        let capacity = self.objects.len();
        let snapshot = std::mem::replace(&mut self.objects, IndexMap::with_capacity(capacity));

        let mut swept = Vec::new();
        for (id, mut object) in snapshot {
            if object.is_marked() {
                self.objects.insert(id, object);
            } else {
                object.bury();
                log::trace!("collected: {}", object);
                swept.push(object);
            }
        }

        debug_assert!(self.roots.iter().all(|id| self.objects.contains_key(id)));

        self.collected_count += swept.len();
        log::debug!("sweep phase complete: {} objects collected", swept.len());
        swept
    }

    /// Performs garbage collection (mark-and-sweep) on the GC heap.
    pub fn collect(&mut self) -> CycleStats {
        let (stats, _) = self.collect_with_tombstones();
        stats
    }

    /// Performs garbage collection (mark-and-sweep) on the GC heap, also returning the tombstones
    /// of the collected objects.
    pub fn collect_with_tombstones(&mut self) -> (CycleStats, Vec<ManagedObject<T>>) {
        let start = Instant::now();
        let initial_objects = self.objects.len();
        log::debug!(
            "collection cycle started: {} objects, {} roots",
            initial_objects,
            self.roots.len(),
        );

        let marked_objects = self.mark();
        let swept = self.sweep();
        let collected_objects = swept.len();
        let final_objects = self.objects.len();

        debug_assert_eq!(marked_objects + collected_objects, initial_objects);
        debug_assert_eq!(final_objects, initial_objects - collected_objects);

        let elapsed = start.elapsed();
        self.time_spent += elapsed;

        let stats = CycleStats {
            initial_objects,
            marked_objects,
            collected_objects,
            final_objects,
            roots: self.roots.len(),
            elapsed,
        };
        self.history.push(stats.clone());
        log::info!(
            "collection cycle {} complete: {} objects freed, {} objects remaining",
            self.history.len(),
            collected_objects,
            final_objects,
        );

        (stats, swept)
    }

    /// Performs garbage collection (mark-and-sweep) on the GC heap, only if necessary.
    pub fn maybe_collect(&mut self) -> Option<CycleStats> {
        if self.objects.len() <= self.params.threshold {
            return None;
        }

        let stats = self.collect();
        if stats.final_objects as f64 > self.params.threshold as f64 * self.params.used_space_ratio
        {
            self.params.threshold =
                (stats.final_objects as f64 / self.params.used_space_ratio) as usize;
            log::debug!("collection threshold raised to {}", self.params.threshold);
        }

        Some(stats)
    }

    /// Drops every object and root, and resets all statistics.
    ///
    /// Handles obtained before the reset are rejected afterwards.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.roots.clear();
        self.collected_count = 0;
        self.history.clear();
        self.time_spent = Duration::ZERO;
        self.marks_valid = false;
        log::debug!("heap cleared");
    }

    /// Checks that the handle was produced by this heap.
    fn owned(&self, gc: Gc) -> GcResult<ObjectId> {
        if gc.heap == self.id {
            Ok(gc.id)
        } else {
            Err(GcError::ForeignHandle(gc.id))
        }
    }

    /// Checks that the handle was produced by this heap and that its object is still live.
    fn resolve(&self, gc: Gc) -> GcResult<ObjectId> {
        let id = self.owned(gc)?;
        if self.objects.contains_key(&id) {
            Ok(id)
        } else {
            Err(GcError::UnknownObject(id))
        }
    }

    fn object_mut(&mut self, gc: Gc) -> GcResult<&mut ManagedObject<T>> {
        let id = self.owned(gc)?;
        self.objects.get_mut(&id).ok_or(GcError::UnknownObject(id))
    }
}
