//!
//! A tracing mark-and-sweep garbage collector over an explicit graph of managed objects.
//!
//! Objects live in a [`GcHeap`], are addressed through opaque [`Gc`] handles, and are reclaimed
//! by [`GcHeap::collect`] once no path from a root reaches them, reference cycles included.
//!

mod dump;
mod error;
mod gc;
mod heap;
mod object;
mod stats;
mod trace;

pub use crate::dump::GraphDump;
pub use crate::error::{GcError, GcResult};
pub use crate::gc::Gc;
pub use crate::heap::{GcHeap, GcParams};
pub use crate::object::{ManagedObject, MarkState, ObjectId};
pub use crate::stats::{CycleStats, GcStats};
