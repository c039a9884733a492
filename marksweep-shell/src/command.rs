use anyhow::{bail, Error};

/// A single line of input to the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Alloc { name: String, data: Option<String> },
    Ref { from: String, to: String },
    Unref { from: String, to: String },
    Root(String),
    Unroot(String),
    Collect,
    Show,
    List,
    Stats,
    History,
    Clear,
    Example(Option<String>),
    Dot(String),
    Tutorial,
    Help,
    Exit,
}

/// Usage lines, as printed by `help`.
pub const USAGE: &[(&str, &str)] = &[
    ("alloc <name> [data]", "allocate a new object"),
    ("ref <from> <to>", "add a reference"),
    ("unref <from> <to>", "remove a reference"),
    ("root <name>", "add an object to the roots"),
    ("unroot <name>", "remove an object from the roots"),
    ("collect", "run a garbage collection cycle"),
    ("show", "show the object graph"),
    ("list", "list named objects"),
    ("stats", "show collector statistics"),
    ("history", "show per-cycle statistics"),
    ("clear", "drop every object and start fresh"),
    ("example [name]", "load a predefined object graph"),
    ("dot <path>", "write the object graph as a Graphviz file"),
    ("tutorial", "walk through a collection step by step"),
    ("help", "show this message"),
    ("exit", "leave the shell"),
];

fn usage(command: &str) -> &str {
    let command = if command == "quit" { "exit" } else { command };
    USAGE
        .iter()
        .map(|(it, _)| *it)
        .find(|it| it.split(' ').next() == Some(command))
        .unwrap_or(command)
}

impl Command {
    /// Parses a non-empty, trimmed line of input.
    pub fn parse(line: &str) -> Result<Command, Error> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(command) => command,
            None => bail!("empty command"),
        };
        let args: Vec<&str> = words.collect();

        let parsed = match (command, args.as_slice()) {
            ("alloc", [name]) => Command::Alloc {
                name: name.to_string(),
                data: None,
            },
            ("alloc", [name, data @ ..]) => Command::Alloc {
                name: name.to_string(),
                data: Some(data.join(" ")),
            },
            ("ref", [from, to]) => Command::Ref {
                from: from.to_string(),
                to: to.to_string(),
            },
            ("unref", [from, to]) => Command::Unref {
                from: from.to_string(),
                to: to.to_string(),
            },
            ("root", [name]) => Command::Root(name.to_string()),
            ("unroot", [name]) => Command::Unroot(name.to_string()),
            ("collect", []) => Command::Collect,
            ("show", []) => Command::Show,
            ("list", []) => Command::List,
            ("stats", []) => Command::Stats,
            ("history", []) => Command::History,
            ("clear", []) => Command::Clear,
            ("example", []) => Command::Example(None),
            ("example", [name]) => Command::Example(Some(name.to_string())),
            ("dot", [path]) => Command::Dot(path.to_string()),
            ("tutorial", []) => Command::Tutorial,
            ("help", []) => Command::Help,
            ("exit", []) | ("quit", []) => Command::Exit,
            (
                "alloc" | "ref" | "unref" | "root" | "unroot" | "collect" | "show" | "list"
                | "stats" | "history" | "clear" | "example" | "dot" | "tutorial" | "help" | "exit"
                | "quit",
                _,
            ) => bail!("usage: {}", usage(command)),
            _ => bail!("unknown command '{}' (type 'help' for a list)", command),
        };

        Ok(parsed)
    }
}
