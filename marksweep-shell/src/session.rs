use anyhow::{anyhow, bail, Error};
use indexmap::IndexMap;

use marksweep_gc::{CycleStats, Gc, GcHeap, GcParams, ObjectId};

/// The payload carried by objects allocated from the shell.
pub type Payload = Option<String>;

/// A heap along with user-chosen names for its objects.
pub struct Session {
    heap: GcHeap<Payload>,
    names: IndexMap<String, Gc>,
    auto_collect: bool,
}

impl Session {
    /// Creates an empty session, which never collects on its own.
    pub fn new() -> Self {
        Self {
            heap: GcHeap::new(),
            names: IndexMap::new(),
            auto_collect: false,
        }
    }

    /// Creates an empty session, which collects as soon as more than `threshold` objects are live.
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            heap: GcHeap::with_params(GcParams {
                threshold,
                ..GcParams::default()
            }),
            names: IndexMap::new(),
            auto_collect: true,
        }
    }

    pub fn heap(&self) -> &GcHeap<Payload> {
        &self.heap
    }

    /// Iterates over the known names, in allocation order.
    pub fn names(&self) -> impl Iterator<Item = (&str, Gc)> + '_ {
        self.names.iter().map(|(name, gc)| (name.as_str(), *gc))
    }

    /// Returns the name bound to the given object, if any.
    pub fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, gc)| gc.id() == id)
            .map(|(name, _)| name.as_str())
    }

    /// Resolves a name to its object handle.
    pub fn lookup(&self, name: &str) -> Result<Gc, Error> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("object '{}' not found", name))
    }

    /// Allocates a new named object.
    ///
    /// If the allocation pushed the heap over its threshold, the cycle it triggered is returned.
    pub fn alloc(
        &mut self,
        name: &str,
        data: Payload,
    ) -> Result<(Gc, Option<CycleStats>), Error> {
        if self.names.contains_key(name) {
            bail!("object '{}' already exists", name);
        }

        let gc = self.heap.allocate(name, data);
        self.names.insert(name.to_string(), gc);

        let cycle = if self.auto_collect {
            self.heap.maybe_collect()
        } else {
            None
        };
        if cycle.is_some() {
            self.forget_collected();
        }

        Ok((gc, cycle))
    }

    pub fn add_reference(&mut self, from: &str, to: &str) -> Result<bool, Error> {
        let (from, to) = (self.lookup(from)?, self.lookup(to)?);
        Ok(self.heap.add_reference(from, to)?)
    }

    pub fn remove_reference(&mut self, from: &str, to: &str) -> Result<bool, Error> {
        let (from, to) = (self.lookup(from)?, self.lookup(to)?);
        Ok(self.heap.remove_reference(from, to)?)
    }

    pub fn add_root(&mut self, name: &str) -> Result<bool, Error> {
        let gc = self.lookup(name)?;
        Ok(self.heap.add_root(gc)?)
    }

    pub fn remove_root(&mut self, name: &str) -> Result<bool, Error> {
        let gc = self.lookup(name)?;
        Ok(self.heap.remove_root(gc)?)
    }

    /// Runs a collection cycle, returning its statistics and the names of the collected objects.
    pub fn collect(&mut self) -> (CycleStats, Vec<String>) {
        let stats = self.heap.collect();
        let forgotten = self.forget_collected();
        (stats, forgotten)
    }

    /// Drops every object and name, and starts over with a fresh heap.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.names.clear();
    }

    fn forget_collected(&mut self) -> Vec<String> {
        let heap = &self.heap;
        let mut forgotten = Vec::new();
        self.names.retain(|name, gc| {
            let live = heap.contains(*gc);
            if !live {
                forgotten.push(name.clone());
            }
            live
        });
        forgotten
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
