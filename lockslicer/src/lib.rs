#![doc = include_str!("../README.md")]

use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod cell;
pub mod harness;
pub mod policy;

pub use cell::{AnomalyCounters, AnomalySnapshot, SharedCell};
pub use harness::{aggregate, Harness};
pub use policy::Policy;

//////////////////////////////////////////// biometrics ////////////////////////////////////////////

static SPAWN_FAILED: biometrics::Counter =
    biometrics::Counter::new("lockslicer.worker.spawn_failed");
static BAD_CONFIGURATION: biometrics::Counter =
    biometrics::Counter::new("lockslicer.error.configuration");

/// Registers this crate's biometrics with the provided Collector.
pub fn register_biometrics(collector: &biometrics::Collector) {
    collector.register_counter(&SPAWN_FAILED);
    collector.register_counter(&BAD_CONFIGURATION);
    cell::register_biometrics(collector);
    harness::register_biometrics(collector);
}

///////////////////////////////////////////// indicio //////////////////////////////////////////////

/// The indicio collector for this crate.
pub static COLLECTOR: indicio::Collector = indicio::Collector::new();

/////////////////////////////////////////////// Error //////////////////////////////////////////////

/// The error conditions of a run.  Anomalies observed by workers are measured
/// data, never errors, and always land in the [Report].
#[derive(Debug)]
pub enum Error {
    /// The configuration cannot describe a runnable experiment.  Rejected
    /// before any thread exists, so no partial state is left behind.
    InvalidConfiguration {
        /// What was wrong with the configuration.
        what: String,
    },
    /// A worker thread could not be created.  The run is aborted and no
    /// report is produced.
    StartupFailure(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::InvalidConfiguration { what } => {
                write!(fmt, "invalid configuration: {what}")
            }
            Error::StartupFailure(err) => write!(fmt, "could not start worker: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        SPAWN_FAILED.click();
        Self::StartupFailure(err)
    }
}

///////////////////////////////////////////// PolicyKind ///////////////////////////////////////////

/// PolicyKind names a synchronization policy without carrying its lock set.
/// [Policy] is the runnable form, created fresh for each run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PolicyKind {
    /// No lock exists; access to the shared cell is unsynchronized.
    NoLock,
    /// The guarded operation executes entirely inside one critical section.
    SingleLock,
    /// The lock guards purely local computation that never touches the cell.
    UselessLock,
    /// Two locks acquired in a fixed order, released in reverse.
    DoubleLock,
}

impl Display for PolicyKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::NoLock => write!(fmt, "no-lock"),
            Self::SingleLock => write!(fmt, "single-lock"),
            Self::UselessLock => write!(fmt, "useless-lock"),
            Self::DoubleLock => write!(fmt, "double-lock"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-lock" => Ok(PolicyKind::NoLock),
            "no_lock" => Ok(PolicyKind::NoLock),
            "single-lock" => Ok(PolicyKind::SingleLock),
            "single_lock" => Ok(PolicyKind::SingleLock),
            "useless-lock" => Ok(PolicyKind::UselessLock),
            "useless_lock" => Ok(PolicyKind::UselessLock),
            "double-lock" => Ok(PolicyKind::DoubleLock),
            "double_lock" => Ok(PolicyKind::DoubleLock),
            _ => Err(format!("invalid policy: {s}")),
        }
    }
}

/////////////////////////////////////////// Configuration //////////////////////////////////////////

/// The immutable parameters of one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Configuration {
    /// The synchronization policy under test.
    pub policy: PolicyKind,
    /// How many workers to spawn.  Always at least one.
    pub thread_count: u64,
    /// How many operation attempts each worker makes.
    pub iterations_per_thread: u64,
    /// The amount each bank-scenario decrement withdraws.
    pub operation_amount: i64,
    /// The value the shared cell starts at.
    pub initial_value: i64,
    /// An opaque label echoed into the report, for collating batch runs.
    pub run_id: u64,
}

impl Configuration {
    /// Create a configuration from explicit fields.  The only defaulting rule
    /// is that an unspecified initial value becomes thread_count *
    /// iterations_per_thread * operation_amount, which targets a zero-sum
    /// outcome for the bank scenario.
    pub fn new(
        policy: PolicyKind,
        thread_count: u64,
        iterations_per_thread: u64,
        operation_amount: i64,
        initial_value: Option<i64>,
        run_id: u64,
    ) -> Result<Self, Error> {
        if thread_count < 1 {
            BAD_CONFIGURATION.click();
            return Err(Error::InvalidConfiguration {
                what: "thread_count must be at least 1".to_string(),
            });
        }
        let initial_value = initial_value
            .unwrap_or(thread_count as i64 * iterations_per_thread as i64 * operation_amount);
        Ok(Self {
            policy,
            thread_count,
            iterations_per_thread,
            operation_amount,
            initial_value,
            run_id,
        })
    }
}

////////////////////////////////////////////// Report //////////////////////////////////////////////

/// The outcome of one run.  Computed exactly once, strictly after every
/// worker has terminated, as a pure function of quiesced state.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// Echoed from the configuration.
    pub run_id: u64,
    /// Echoed from the configuration.
    pub thread_count: u64,
    /// Echoed from the configuration.
    pub iterations_per_thread: u64,
    /// Echoed from the configuration.
    pub operation_amount: i64,
    /// Echoed from the configuration.
    pub initial_value: i64,
    /// The value of the shared cell after the join barrier.
    pub final_value: i64,
    /// The value the policy's theory predicts.
    pub expected_value: i64,
    /// Anomalies observed by workers, reliable under every policy.
    pub anomalies: AnomalySnapshot,
    /// Wall-clock seconds from just before the first spawn to just after the
    /// last join.
    pub elapsed_seconds: f64,
}

impl Report {
    /// True iff the final value matches the theoretical expectation.
    pub fn is_exact(&self) -> bool {
        self.final_value == self.expected_value
    }
}

/////////////////////////////////////////////// tests //////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_kind_no_lock() {
        assert_eq!("no-lock", PolicyKind::NoLock.to_string());
        assert_eq!(Ok(PolicyKind::NoLock), PolicyKind::from_str("no-lock"));
        assert_eq!(Ok(PolicyKind::NoLock), PolicyKind::from_str("no_lock"));
    }

    #[test]
    fn policy_kind_single_lock() {
        assert_eq!("single-lock", PolicyKind::SingleLock.to_string());
        assert_eq!(
            Ok(PolicyKind::SingleLock),
            PolicyKind::from_str("single-lock")
        );
    }

    #[test]
    fn policy_kind_useless_lock() {
        assert_eq!("useless-lock", PolicyKind::UselessLock.to_string());
        assert_eq!(
            Ok(PolicyKind::UselessLock),
            PolicyKind::from_str("useless_lock")
        );
    }

    #[test]
    fn policy_kind_double_lock() {
        assert_eq!("double-lock", PolicyKind::DoubleLock.to_string());
        assert_eq!(
            Ok(PolicyKind::DoubleLock),
            PolicyKind::from_str("double-lock")
        );
    }

    #[test]
    fn policy_kind_error() {
        assert!(PolicyKind::from_str("spin-lock").is_err());
    }

    #[test]
    fn configuration_rejects_zero_threads() {
        let config = Configuration::new(PolicyKind::SingleLock, 0, 100, 0, Some(0), 0);
        assert!(matches!(config, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn configuration_defaults_initial_value() {
        let config = Configuration::new(PolicyKind::NoLock, 8, 100_000, 10, None, 0).unwrap();
        assert_eq!(8_000_000, config.initial_value);
    }

    #[test]
    fn configuration_keeps_explicit_initial_value() {
        let config = Configuration::new(PolicyKind::NoLock, 8, 100_000, 10, Some(25), 0).unwrap();
        assert_eq!(25, config.initial_value);
    }
}
