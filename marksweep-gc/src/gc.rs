use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::object::ObjectId;

static NEXT_HEAP_ID: AtomicU32 = AtomicU32::new(1);

/// The identity of a heap, used to scope handles to the heap that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HeapId(u32);

impl HeapId {
    pub(crate) fn next() -> Self {
        Self(NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Represent a handle to a GC-allocated object.
///
/// Handles are plain copyable indices: they own nothing and never keep an object alive.
/// Only the [`GcHeap`](crate::GcHeap) that allocated the object can produce a handle to it,
/// and every other heap rejects it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gc {
    pub(crate) heap: HeapId,
    pub(crate) id: ObjectId,
}

impl Gc {
    /// Returns the identity of the referenced object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl fmt::Debug for Gc {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc({})", self.id)
    }
}

impl fmt::Display for Gc {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
