//! The counter scenario under the double-lock policy:  two mutexes acquired
//! in a fixed global order around every increment.  Completion demonstrates
//! deadlock avoidance by ordering; the elapsed time measures the nesting
//! overhead.  Exploratory scenario, so it exits zero regardless of outcome.

use std::sync::Arc;

use arrrg::CommandLine;
use indicio::stdio::StdioEmitter;
use indicio::INFO;

use lockslicer::{Configuration, Harness, PolicyKind, COLLECTOR};

#[derive(Clone, Debug, Eq, PartialEq, arrrg_derive::CommandLine)]
pub struct Options {
    #[arrrg(optional, "Number of worker threads to spawn.")]
    pub threads: u64,
    #[arrrg(optional, "Increments per thread.")]
    pub iterations: u64,
    #[arrrg(optional, "Run identifier.")]
    pub run_id: u64,
    #[arrrg(flag, "Emit clues to stderr.")]
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            threads: 4,
            iterations: 50_000,
            run_id: 0,
            verbose: false,
        }
    }
}

fn main() {
    let (options, free) = Options::from_command_line(
        "USAGE: lockslicer-double-lock [--threads N] [--iterations N] [--run-id N]",
    );
    if !free.is_empty() {
        eprintln!("lockslicer-double-lock takes no positional arguments");
        std::process::exit(1);
    }
    if options.verbose {
        COLLECTOR.register(Arc::new(StdioEmitter));
        COLLECTOR.set_verbosity(INFO);
    }
    let config = match Configuration::new(
        PolicyKind::DoubleLock,
        options.threads,
        options.iterations,
        0,
        Some(0),
        options.run_id,
    ) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    let report = match Harness::new(config).run() {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    println!(
        "final value = {} (expected {}) with locks nested first-then-second | time={:.6}",
        report.final_value, report.expected_value, report.elapsed_seconds,
    );
}
