use std::fs;
use std::io;
use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Error};

use marksweep_gc::{CycleStats, Gc};

use crate::command::{Command, USAGE};
use crate::presets::{self, PRESETS};
use crate::render;
use crate::session::Session;

/// Whether the shell should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Launches an interactive command loop over the given session.
pub fn interactive(session: &mut Session, verbose: bool) -> Result<(), Error> {
    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    writeln!(&mut stdout, "Mark and Sweep Garbage Collector - Interactive Shell")?;
    writeln!(&mut stdout, "Type 'help' to see available commands.")?;

    let mut counter = 0;
    let mut line = String::new();
    loop {
        write!(&mut stdout, "({}) gc> ", counter)?;
        stdout.flush()?;
        line.clear();
        stdin.read_line(&mut line)?;
        if line.is_empty() {
            writeln!(&mut stdout, "exit")?;
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(&mut stdout, "ERROR: {}", err)?;
                continue;
            }
        };

        let start = Instant::now();
        let flow = match execute(session, command, &mut stdin, &mut stdout) {
            Ok(flow) => flow,
            Err(err) => {
                writeln!(&mut stdout, "ERROR: {}", err)?;
                Flow::Continue
            }
        };
        let elapsed = start.elapsed();
        if verbose {
            writeln!(
                &mut stdout,
                "Execution time: {} ms ({} µs)",
                elapsed.as_millis(),
                elapsed.as_micros(),
            )?;
        }

        if flow == Flow::Exit {
            break;
        }
        counter += 1;
    }

    writeln!(&mut stdout, "Goodbye!")?;
    Ok(())
}

fn print_cycle(out: &mut dyn Write, stats: &CycleStats) -> io::Result<()> {
    writeln!(out, "Collection stats:")?;
    writeln!(out, "  - marked (reachable): {}", stats.marked_objects)?;
    writeln!(out, "  - collected (garbage): {}", stats.collected_objects)?;
    writeln!(out, "  - remaining: {}", stats.final_objects)
}

/// The guided walkthrough: an optional step heading, then the command to run.
const TUTORIAL: &[(Option<&str>, &str)] = &[
    (Some("Step 1: Create some objects"), "alloc root"),
    (None, "alloc child1"),
    (None, "alloc child2"),
    (None, "alloc orphan"),
    (Some("Step 2: Create references"), "ref root child1"),
    (None, "ref root child2"),
    (Some("Step 3: Set root object"), "root root"),
    (Some("Step 4: View the object graph"), "show"),
    (Some("Step 5: Run garbage collection"), "collect"),
];

/// Runs the guided walkthrough on a cleared session.
///
/// Waits for a line of `input` before each step.
fn tutorial(
    session: &mut Session,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), Error> {
    writeln!(out, "TUTORIAL: Mark and Sweep Garbage Collection")?;
    writeln!(out, "(the session starts from an empty heap)")?;
    session.clear();

    let mut line = String::new();
    for (heading, step) in TUTORIAL {
        writeln!(out)?;
        if let Some(heading) = heading {
            writeln!(out, "{}", heading)?;
        }
        writeln!(out, "Command: {}", step)?;
        write!(out, "Press Enter to execute...")?;
        out.flush()?;
        line.clear();
        input.read_line(&mut line)?;

        execute(session, Command::parse(step)?, input, out)?;
        if *step == "show" {
            writeln!(out, "note: 'orphan' has no references and is not rooted,")?;
            writeln!(out, "      so it will be collected as garbage.")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Tutorial complete!")?;
    writeln!(out, "Try building your own graphs with alloc, ref, root and collect.")?;
    writeln!(out, "Type 'help' for all commands.")?;
    Ok(())
}

/// Executes a single command against the session, writing its output to `out`.
///
/// Only `tutorial` reads from `input`, to pause between its steps.
pub fn execute(
    session: &mut Session,
    command: Command,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<Flow, Error> {
    match command {
        Command::Alloc { name, data } => {
            let (gc, cycle) = session.alloc(&name, data)?;
            if let Some(stats) = cycle {
                writeln!(out, "threshold exceeded, collection triggered")?;
                print_cycle(out, &stats)?;
            }
            match session.heap().get(gc) {
                Ok(object) => writeln!(out, "created object: {}", object)?,
                Err(_) => writeln!(out, "note: '{}' was collected right away", name)?,
            }
        }
        Command::Ref { from, to } => {
            if session.add_reference(&from, &to)? {
                writeln!(out, "added reference: {} -> {}", from, to)?;
            } else {
                writeln!(out, "reference {} -> {} already exists", from, to)?;
            }
        }
        Command::Unref { from, to } => {
            if session.remove_reference(&from, &to)? {
                writeln!(out, "removed reference: {} -> {}", from, to)?;
            } else {
                writeln!(out, "there is no reference {} -> {}", from, to)?;
            }
        }
        Command::Root(name) => {
            session.add_root(&name)?;
            writeln!(out, "added '{}' to roots", name)?;
        }
        Command::Unroot(name) => {
            session.remove_root(&name)?;
            writeln!(out, "removed '{}' from roots", name)?;
        }
        Command::Collect => {
            write!(out, "{}", render::ascii(session.heap(), "Before GC"))?;
            let (stats, forgotten) = session.collect();
            print_cycle(out, &stats)?;
            if !forgotten.is_empty() {
                writeln!(out, "  - freed: {}", forgotten.join(", "))?;
            }
        }
        Command::Show => {
            write!(out, "{}", session.heap().dump())?;
            write!(out, "{}", render::ascii(session.heap(), "Current State"))?;
        }
        Command::List => {
            if session.heap().is_empty() {
                writeln!(out, "no objects allocated")?;
            } else {
                writeln!(out, "Objects:")?;
                let mut names: Vec<(&str, Gc)> = session.names().collect();
                names.sort_by(|a, b| a.0.cmp(b.0));
                for (name, gc) in names {
                    let marker = if session.heap().is_root(gc) { '*' } else { ' ' };
                    let references: Vec<&str> = session
                        .heap()
                        .get(gc)?
                        .references()
                        .iter()
                        .filter_map(|id| session.name_of(*id))
                        .collect();
                    if references.is_empty() {
                        writeln!(out, "  {} {}", marker, name)?;
                    } else {
                        writeln!(out, "  {} {} -> {}", marker, name, references.join(", "))?;
                    }
                }
            }
        }
        Command::Stats => {
            let stats = session.heap().stats();
            writeln!(out, "Garbage Collector Statistics:")?;
            writeln!(out, "  Total objects: {}", stats.total_objects)?;
            writeln!(out, "  Root objects: {}", stats.root_objects)?;
            writeln!(out, "  Total collected: {}", stats.total_collected)?;
            writeln!(out, "  GC cycles run: {}", stats.collection_cycles)?;
            writeln!(
                out,
                "  Time spent collecting: {} µs",
                stats.total_time_spent.as_micros()
            )?;
        }
        Command::History => {
            if session.heap().history().is_empty() {
                writeln!(out, "no collection cycles yet")?;
            }
            for (idx, cycle) in session.heap().history().iter().enumerate() {
                writeln!(
                    out,
                    "  cycle {}: {} objects, {} marked, {} collected, {} remaining, {} roots",
                    idx + 1,
                    cycle.initial_objects,
                    cycle.marked_objects,
                    cycle.collected_objects,
                    cycle.final_objects,
                    cycle.roots,
                )?;
            }
        }
        Command::Clear => {
            session.clear();
            writeln!(out, "cleared all objects")?;
        }
        Command::Example(None) => {
            writeln!(out, "Available examples:")?;
            for preset in PRESETS {
                writeln!(out, "  {:<9} - {}", preset.name, preset.description)?;
            }
            writeln!(out, "Usage: example <name>")?;
        }
        Command::Example(Some(name)) => {
            let preset = presets::find(&name)
                .with_context(|| format!("no example named '{}' (type 'example' for a list)", name))?;
            writeln!(out, "loading example '{}'...", preset.name)?;
            preset.load(session)?;
            write!(out, "{}", session.heap().dump())?;
            if let Some(hint) = preset.hint {
                writeln!(out, "hint: {}", hint)?;
            }
        }
        Command::Dot(path) => {
            let title = format!("Object Graph ({} objects)", session.heap().len());
            fs::write(&path, render::dot(session.heap(), &title))
                .with_context(|| format!("could not write '{}'", path))?;
            writeln!(out, "wrote object graph to '{}'", path)?;
        }
        Command::Tutorial => tutorial(session, input, out)?,
        Command::Help => {
            writeln!(out, "Commands:")?;
            for (usage, description) in USAGE {
                writeln!(out, "  {:<22} {}", usage, description)?;
            }
        }
        Command::Exit => return Ok(Flow::Exit),
    }

    Ok(Flow::Continue)
}
