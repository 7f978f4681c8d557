//! The lifecycle of one run:  instantiate the cell and the policy's locks,
//! spawn the workers, join them all, and aggregate the quiesced state into a
//! report.  A harness is consumed by [Harness::run], so a run can never be
//! repeated or observed half-done.

use std::sync::Arc;
use std::time::Instant;

use indicio::{clue, ERROR, INFO};

use crate::cell::{AnomalyCounters, AnomalySnapshot, SharedCell};
use crate::policy::Policy;
use crate::{Configuration, Error, PolicyKind, Report, COLLECTOR};

//////////////////////////////////////////// biometrics ////////////////////////////////////////////

static RUN_STARTED: biometrics::Counter = biometrics::Counter::new("lockslicer.run.started");
static RUN_FINISHED: biometrics::Counter = biometrics::Counter::new("lockslicer.run.finished");
static WORKER_SPAWNED: biometrics::Counter = biometrics::Counter::new("lockslicer.worker.spawned");

pub fn register_biometrics(collector: &biometrics::Collector) {
    collector.register_counter(&RUN_STARTED);
    collector.register_counter(&RUN_FINISHED);
    collector.register_counter(&WORKER_SPAWNED);
}

///////////////////////////////////////////// local work ///////////////////////////////////////////

/// How much local computation the useless-lock policy performs per attempt.
const LOCAL_WORK: i64 = 100;

fn compute_local(x: i64) -> i64 {
    let mut acc = 0;
    for i in 0..x {
        acc += (i % 3) - (i % 2);
    }
    acc
}

////////////////////////////////////////////// worker //////////////////////////////////////////////

/// One worker's bounded stream of operation attempts.  The operation shape is
/// keyed off the policy, and what lies inside each critical section is kept
/// exactly as the experiment defines it.
fn run_worker(
    cell: &SharedCell,
    policy: &Policy,
    anomalies: &AnomalyCounters,
    iterations: u64,
    amount: i64,
) {
    for _ in 0..iterations {
        match policy {
            Policy::NoLock => {
                // Check-then-act with no synchronization.  The window
                // between the check, the re-read, and the store is the race
                // under study.
                if cell.read_weak() >= amount {
                    let debited = cell.read_weak() - amount;
                    cell.write_weak(debited);
                    if cell.read_weak() < 0 {
                        anomalies.click_went_negative();
                    }
                } else {
                    anomalies.click_insufficient_funds();
                }
            }
            Policy::SingleLock { lock } => {
                // The whole read-modify-write sits inside the critical
                // section, so every increment linearizes.
                let _held = lock.lock().unwrap();
                cell.write_weak(cell.read_weak() + 1);
            }
            Policy::UselessLock { lock } => {
                // The lock serializes workers that share nothing.
                let _held = lock.lock().unwrap();
                std::hint::black_box(compute_local(LOCAL_WORK));
            }
            Policy::DoubleLock { first, second } => {
                // first-then-second in every worker; guards drop in reverse
                // declaration order, so release is second-then-first.
                let _held_first = first.lock().unwrap();
                let _held_second = second.lock().unwrap();
                cell.write_weak(cell.read_weak() + 1);
            }
        }
    }
}

////////////////////////////////////////////// Harness /////////////////////////////////////////////

/// Owns one run from configuration to report.
pub struct Harness {
    config: Configuration,
}

impl Harness {
    /// A harness for the provided configuration.
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// The configuration this harness will run.
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Spawn the workers, join them all, and aggregate.  Consumes the
    /// harness:  a second run requires a second harness.
    ///
    /// Elapsed time covers just before the first spawn to just after the
    /// last join.  If a spawn fails, every already-spawned worker is joined
    /// before the error is returned, and no report is produced.
    pub fn run(self) -> Result<Report, Error> {
        RUN_STARTED.click();
        clue!(COLLECTOR, INFO, {
            run_id: self.config.run_id,
            policy: self.config.policy.to_string(),
            threads: self.config.thread_count,
            iterations: self.config.iterations_per_thread,
        });
        let cell = Arc::new(SharedCell::new(self.config.initial_value));
        let policy = Arc::new(Policy::new(self.config.policy));
        let anomalies = Arc::new(AnomalyCounters::new());
        let iterations = self.config.iterations_per_thread;
        let amount = self.config.operation_amount;
        let mut workers = Vec::with_capacity(self.config.thread_count as usize);
        let start = Instant::now();
        for idx in 0..self.config.thread_count {
            let c = Arc::clone(&cell);
            let p = Arc::clone(&policy);
            let a = Arc::clone(&anomalies);
            let spawned = std::thread::Builder::new()
                .name(format!("lockslicer-worker-{}", idx))
                .spawn(move || run_worker(&c, &p, &a, iterations, amount));
            match spawned {
                Ok(worker) => {
                    WORKER_SPAWNED.click();
                    workers.push(worker);
                }
                Err(err) => {
                    clue!(COLLECTOR, ERROR, {
                        spawn_failed: err.to_string(),
                        already_spawned: workers.len() as u64,
                    });
                    // Quiesce what did spawn before surfacing the failure.
                    for worker in workers.into_iter() {
                        let _ = worker.join();
                    }
                    return Err(Error::from(err));
                }
            }
        }
        for worker in workers.into_iter() {
            worker.join().expect("worker should finish successfully");
        }
        let elapsed_seconds = start.elapsed().as_secs_f64();
        // The joins above are the barrier; everything read below is
        // quiesced.
        let report = aggregate(
            &self.config,
            cell.read_weak(),
            anomalies.snapshot(),
            elapsed_seconds,
        );
        RUN_FINISHED.click();
        clue!(COLLECTOR, INFO, {
            run_id: report.run_id,
            final_value: report.final_value,
            expected_value: report.expected_value,
            elapsed_seconds: report.elapsed_seconds,
        });
        Ok(report)
    }
}

///////////////////////////////////////////// aggregate ////////////////////////////////////////////

/// Compute the report for a finished run.  Pure:  touches no live worker
/// state and performs no synchronization of its own.
///
/// The expectation is the policy's theory:  the bank scenario drains
/// thread_count * iterations_per_thread * amount from the initial balance;
/// the counter scenarios add thread_count * iterations_per_thread to the
/// initial value (zero, as the counter binaries configure it); the
/// useless-lock scenario never touches the cell at all.
pub fn aggregate(
    config: &Configuration,
    final_value: i64,
    anomalies: AnomalySnapshot,
    elapsed_seconds: f64,
) -> Report {
    let volume = config.thread_count as i64 * config.iterations_per_thread as i64;
    let expected_value = match config.policy {
        PolicyKind::NoLock => config.initial_value - volume * config.operation_amount,
        PolicyKind::SingleLock => config.initial_value + volume,
        PolicyKind::DoubleLock => config.initial_value + volume,
        PolicyKind::UselessLock => config.initial_value,
    };
    Report {
        run_id: config.run_id,
        thread_count: config.thread_count,
        iterations_per_thread: config.iterations_per_thread,
        operation_amount: config.operation_amount,
        initial_value: config.initial_value,
        final_value,
        expected_value,
        anomalies,
        elapsed_seconds,
    }
}

/////////////////////////////////////////////// tests //////////////////////////////////////////////
