use std::time::Duration;

/// Snapshot of a single collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Live objects when the cycle started.
    pub initial_objects: usize,
    /// Objects proven reachable by the mark phase.
    pub marked_objects: usize,
    /// Objects reclaimed by the sweep phase.
    pub collected_objects: usize,
    /// Live objects when the cycle ended.
    pub final_objects: usize,
    /// Size of the root set during the cycle.
    pub roots: usize,
    /// Wall-clock time spent in the cycle.
    pub elapsed: Duration,
}

/// Aggregate statistics of a heap, across all of its cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct GcStats {
    pub total_objects: usize,
    pub root_objects: usize,
    pub total_collected: usize,
    pub collection_cycles: usize,
    pub total_time_spent: Duration,
}
