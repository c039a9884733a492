use std::fmt;

use crate::heap::GcHeap;

const RULE: &str = "------------------------------------------------------------";

/// A read-only, printable view of a heap's object graph.
///
/// Each live object is printed on its own line, in identity order, along with
/// its mark state and outgoing references. Roots are flagged with a `*`.
pub struct GraphDump<'a, T> {
    heap: &'a GcHeap<T>,
}

impl<'a, T> GraphDump<'a, T> {
    pub(crate) fn new(heap: &'a GcHeap<T>) -> Self {
        Self { heap }
    }
}

impl<T> fmt::Display for GraphDump<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OBJECT GRAPH:")?;
        writeln!(f, "{}", RULE)?;

        if self.heap.is_empty() {
            return writeln!(f, "  (empty)");
        }

        for (gc, object) in self.heap.iter() {
            let marker = if self.heap.is_root(gc) { "*" } else { " " };
            write!(
                f,
                "  {} {}: {} [{}]",
                marker,
                object.id(),
                object.name(),
                object.state(),
            )?;

            if !object.references().is_empty() {
                let references = object
                    .references()
                    .iter()
                    .map(|it| it.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, " -> [{}]", references)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", RULE)
    }
}
