//! The bank scenario under the no-lock policy:  concurrent
//! decrement-if-sufficient with no synchronization, to demonstrate lost
//! updates and overdraws.  Anomalies are the measured phenomenon, so this
//! exits zero even when they occur.

use std::sync::Arc;

use arrrg::CommandLine;
use indicio::stdio::StdioEmitter;
use indicio::INFO;

use lockslicer::{Configuration, Harness, PolicyKind, COLLECTOR};

#[derive(Clone, Debug, Eq, PartialEq, arrrg_derive::CommandLine)]
pub struct Options {
    #[arrrg(optional, "Number of worker threads to spawn.")]
    pub threads: u64,
    #[arrrg(optional, "Withdrawal attempts per thread.")]
    pub iterations: u64,
    #[arrrg(optional, "Amount withdrawn per attempt.")]
    pub amount: i64,
    #[arrrg(optional, "Initial balance (default: threads * iterations * amount).")]
    pub initial_value: Option<i64>,
    #[arrrg(optional, "Run identifier echoed into the CSV line.")]
    pub run_id: u64,
    #[arrrg(flag, "Emit clues to stderr.")]
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            threads: 8,
            iterations: 100_000,
            amount: 10,
            initial_value: None,
            run_id: 0,
            verbose: false,
        }
    }
}

fn main() {
    let (options, free) = Options::from_command_line(
        "USAGE: lockslicer-race [--threads N] [--iterations N] [--amount N] [--initial-value N] [--run-id N]",
    );
    if !free.is_empty() {
        eprintln!("lockslicer-race takes no positional arguments");
        std::process::exit(1);
    }
    if options.verbose {
        COLLECTOR.register(Arc::new(StdioEmitter));
        COLLECTOR.set_verbosity(INFO);
    }
    let config = match Configuration::new(
        PolicyKind::NoLock,
        options.threads,
        options.iterations,
        options.amount,
        options.initial_value,
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
        "final balance = {} (expected {}) | overdraws={} | failed_checks={} | time={:.6}",
        report.final_value,
        report.expected_value,
        report.anomalies.went_negative,
        report.anomalies.insufficient_funds,
        report.elapsed_seconds,
    );
    // CSV, last line:
    // run_id,threads,iterations,amount,initial_value,final_value,expected_value,overdraws,failed_checks,time_sec
    println!(
        "{},{},{},{},{},{},{},{},{},{:.6}",
        report.run_id,
        report.thread_count,
        report.iterations_per_thread,
        report.operation_amount,
        report.initial_value,
        report.final_value,
        report.expected_value,
        report.anomalies.went_negative,
        report.anomalies.insufficient_funds,
        report.elapsed_seconds,
    );
}
