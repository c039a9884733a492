use std::fmt::Write;

use marksweep_gc::{GcHeap, ManagedObject, ObjectId};

const RULE: &str = "======================================================================";

fn lookup<T>(heap: &GcHeap<T>, id: ObjectId) -> Option<&ManagedObject<T>> {
    heap.handle(id).and_then(|gc| heap.get(gc).ok())
}

fn mark_glyph<T>(object: &ManagedObject<T>) -> char {
    if object.is_marked() {
        '+'
    } else {
        'x'
    }
}

/// Renders the object graph as text, flagging roots and mark states.
pub fn ascii<T>(heap: &GcHeap<T>, phase: &str) -> String {
    let mut output = String::new();
    // writing into a `String` cannot fail.
    let _ = render_ascii(&mut output, heap, phase);
    output
}

fn render_ascii<T>(output: &mut String, heap: &GcHeap<T>, phase: &str) -> std::fmt::Result {
    writeln!(output, "{}", RULE)?;
    writeln!(output, "ASCII VISUALIZATION - {}", phase)?;
    writeln!(output, "{}", RULE)?;

    if heap.is_empty() {
        return writeln!(output, "(no objects)");
    }

    writeln!(output, "Legend:")?;
    writeln!(output, "  *  = root object")?;
    writeln!(output, "  +  = marked (reachable)")?;
    writeln!(output, "  x  = unmarked (garbage)")?;
    writeln!(output, "  -> = reference")?;
    writeln!(output)?;

    for (gc, object) in heap.iter() {
        let root = if heap.is_root(gc) { '*' } else { ' ' };
        writeln!(
            output,
            "{} [{}] Object {}: {}",
            root,
            mark_glyph(object),
            object.id().get(),
            object.name(),
        )?;

        for id in object.references() {
            match lookup(heap, *id) {
                Some(target) => writeln!(
                    output,
                    "       -> [{}] Object {}: {}",
                    mark_glyph(target),
                    target.id().get(),
                    target.name(),
                )?,
                None => writeln!(output, "       -> [?] Object {}", id.get())?,
            }
        }
    }

    writeln!(output, "{}", RULE)
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders the object graph in the Graphviz DOT language.
///
/// Roots are drawn as double circles, marked objects in green and unmarked ones in red.
pub fn dot<T>(heap: &GcHeap<T>, title: &str) -> String {
    let mut output = String::new();
    let _ = render_dot(&mut output, heap, title);
    output
}

fn render_dot<T>(output: &mut String, heap: &GcHeap<T>, title: &str) -> std::fmt::Result {
    writeln!(output, "digraph \"{}\" {{", escape(title))?;
    writeln!(output, "    label=\"{}\";", escape(title))?;
    writeln!(output, "    node [style=filled, fontname=\"Helvetica\"];")?;

    for (gc, object) in heap.iter() {
        let shape = if heap.is_root(gc) {
            "doublecircle"
        } else {
            "circle"
        };
        let color = if object.is_marked() {
            "lightgreen"
        } else {
            "lightcoral"
        };
        writeln!(
            output,
            "    n{} [label=\"{}\\n{}\", shape={}, fillcolor={}];",
            object.id().get(),
            object.id(),
            escape(object.name()),
            shape,
            color,
        )?;
    }

    for object in heap.objects() {
        for id in object.references() {
            if lookup(heap, *id).is_some() {
                writeln!(output, "    n{} -> n{};", object.id().get(), id.get())?;
            }
        }
    }

    writeln!(output, "}}")
}
