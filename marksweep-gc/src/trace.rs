use indexmap::{IndexMap, IndexSet};

use crate::object::{ManagedObject, ObjectId};

/// The mark phase: a depth-first traversal of the object graph, starting from the roots.
///
/// The traversal uses an explicit work-list instead of the call stack, so that arbitrarily
/// deep reference chains cannot overflow it.
#[derive(Debug, Default)]
pub(crate) struct Tracer {
    stack: Vec<ObjectId>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every mark, then marks everything reachable from `roots`.
    ///
    /// Returns the number of objects marked.
    pub fn trace<T>(
        &mut self,
        objects: &mut IndexMap<ObjectId, ManagedObject<T>>,
        roots: &IndexSet<ObjectId>,
    ) -> usize {
        for object in objects.values_mut() {
            object.clear_mark();
        }

        let mut marked = 0;
        for root in roots.iter() {
            marked += self.trace_from(objects, *root);
        }
        marked
    }

    fn trace_from<T>(
        &mut self,
        objects: &mut IndexMap<ObjectId, ManagedObject<T>>,
        root: ObjectId,
    ) -> usize {
        let mut marked = 0;
        self.stack.clear();
        self.stack.push(root);

        while let Some(id) = self.stack.pop() {
            let object = match objects.get_mut(&id) {
                Some(object) => object,
                None => continue,
            };
            // an already-marked object ends this branch, which is what makes cycles terminate.
            if object.is_marked() {
                continue;
            }
            object.mark();
            marked += 1;
            log::trace!("marked: {}", object);

            // reversed, so that references get visited in reference-list order.
            self.stack.extend(object.references().iter().rev().copied());
        }

        marked
    }
}
