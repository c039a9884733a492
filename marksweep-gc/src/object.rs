use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of object identities, shared by every heap in the process.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// The identity of a managed object.
///
/// Identities are strictly increasing in allocation order and are never reused,
/// even after the object they named has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw integer value of this identity.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The mark state of a managed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkState {
    /// Not (yet) proven reachable in the current cycle.
    Unmarked,
    /// Proven reachable in the current cycle.
    Marked,
    /// Reclaimed by a sweep. This state is terminal.
    Collected,
}

impl MarkState {
    /// Returns the lowercase name of this state.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkState::Unmarked => "unmarked",
            MarkState::Marked => "marked",
            MarkState::Collected => "collected",
        }
    }
}

impl fmt::Display for MarkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a node of the object graph, as it is stored within the heap.
#[derive(Debug, Clone)]
pub struct ManagedObject<T> {
    id: ObjectId,
    name: String,
    data: T,
    /// Outgoing edges, in insertion order and without duplicates.
    references: Vec<ObjectId>,
    state: MarkState,
}

impl<T> ManagedObject<T> {
    /// Creates a fresh, unmarked object with no outgoing references.
    pub(crate) fn new(name: String, data: T) -> Self {
        Self {
            id: ObjectId::next(),
            name,
            data,
            references: Vec::new(),
            state: MarkState::Unmarked,
        }
    }

    /// Returns the identity of this object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the display name of this object.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the payload of this object.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns the payload of this object, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Returns the outgoing references of this object, in insertion order.
    #[inline]
    pub fn references(&self) -> &[ObjectId] {
        &self.references
    }

    /// Returns the current mark state of this object.
    #[inline]
    pub fn state(&self) -> MarkState {
        self.state
    }

    /// Returns whether this object was reached by the latest mark phase.
    #[inline]
    pub fn is_marked(&self) -> bool {
        self.state == MarkState::Marked
    }

    /// Appends a reference to `target`, unless already present.
    ///
    /// Returns whether the reference list changed.
    pub(crate) fn add_reference(&mut self, target: ObjectId) -> bool {
        if self.references.contains(&target) {
            return false;
        }
        self.references.push(target);
        true
    }

    /// Removes the reference to `target`, if present.
    ///
    /// Returns whether the reference list changed.
    pub(crate) fn remove_reference(&mut self, target: ObjectId) -> bool {
        match self.references.iter().position(|it| *it == target) {
            Some(idx) => {
                self.references.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Clears the mark, as the first step of a mark phase.
    pub(crate) fn clear_mark(&mut self) {
        self.state = MarkState::Unmarked;
    }

    /// Marks this object as reachable.
    pub(crate) fn mark(&mut self) {
        self.state = MarkState::Marked;
    }

    /// Turns this object into a tombstone.
    pub(crate) fn bury(&mut self) {
        self.state = MarkState::Collected;
    }
}

impl<T> fmt::Display for ManagedObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object({}: {}, refs={}, state={})",
            self.id,
            self.name,
            self.references.len(),
            self.state,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_object_is_unmarked_and_empty() {
        let object = ManagedObject::new(String::from("test"), 42);

        assert_eq!(object.name(), "test");
        assert_eq!(*object.data(), 42);
        assert_eq!(object.state(), MarkState::Unmarked);
        assert!(object.references().is_empty());
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let first = ManagedObject::new(String::from("a"), ());
        let second = ManagedObject::new(String::from("a"), ());

        assert!(first.id() < second.id());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn duplicate_references_are_ignored() {
        let mut object = ManagedObject::new(String::from("a"), ());
        let target = ManagedObject::new(String::from("b"), ());

        assert!(object.add_reference(target.id()));
        assert!(!object.add_reference(target.id()));
        assert_eq!(object.references(), &[target.id()]);
    }

    #[test]
    fn removing_a_missing_reference_is_a_no_op() {
        let mut object = ManagedObject::new(String::from("a"), ());
        let first = ManagedObject::new(String::from("b"), ());
        let second = ManagedObject::new(String::from("c"), ());

        object.add_reference(first.id());
        object.add_reference(second.id());

        assert!(!object.remove_reference(object.id()));
        assert!(object.remove_reference(first.id()));
        assert!(!object.remove_reference(first.id()));
        assert_eq!(object.references(), &[second.id()]);
    }

    #[test]
    fn display_format() {
        let mut object = ManagedObject::new(String::from("node"), ());
        object.add_reference(object.id());
        object.mark();

        let expected = format!("Object({}: node, refs=1, state=marked)", object.id());
        assert_eq!(object.to_string(), expected);
    }
}
