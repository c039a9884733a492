//!
//! This is the interactive shell and demo runner for the marksweep garbage collector.
//!
#![warn(missing_docs)]

use std::io;

use clap::Parser;

mod command;
mod demos;
mod presets;
mod render;
mod session;
mod shell;

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Parser)]
#[clap(about, version)]
struct Options {
    /// Run a scripted demo instead of the interactive shell ('all' runs every demo).
    #[clap(short, long, value_name = "NAME")]
    demo: Option<String>,

    /// List the available demos.
    #[clap(long)]
    list_demos: bool,

    /// Collect automatically whenever more than this many objects are live.
    #[clap(short, long)]
    threshold: Option<usize>,

    /// Seed for the 'random' demo.
    #[clap(long, default_value = "0")]
    seed: u64,

    /// Enable verbose output (collector logs and timing information).
    #[clap(short = 'v')]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let opts: Options = Options::parse();

    let filter = if opts.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if opts.list_demos {
        for (name, description) in demos::DEMOS {
            println!("  {:<15} {}", name, description);
        }
        println!("  {:<15} {}", "all", "every demo above, in order");
        return Ok(());
    }

    match opts.demo {
        Some(name) => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            demos::run(&name, opts.seed, &mut stdout)?;
        }
        None => {
            let mut session = match opts.threshold {
                Some(threshold) => Session::with_threshold(threshold),
                None => Session::new(),
            };
            shell::interactive(&mut session, opts.verbose)?;
        }
    }

    Ok(())
}
