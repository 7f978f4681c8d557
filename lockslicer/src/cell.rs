//! The shared integer cell under test and the anomaly counters that observe
//! it.  Both are scoped to exactly one run and constructed fresh by the
//! harness; nothing here is process-global.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

//////////////////////////////////////////// biometrics ////////////////////////////////////////////

static WENT_NEGATIVE: biometrics::Counter =
    biometrics::Counter::new("lockslicer.anomaly.went_negative");
static INSUFFICIENT_FUNDS: biometrics::Counter =
    biometrics::Counter::new("lockslicer.anomaly.insufficient_funds");

pub fn register_biometrics(collector: &biometrics::Collector) {
    collector.register_counter(&WENT_NEGATIVE);
    collector.register_counter(&INSUFFICIENT_FUNDS);
}

///////////////////////////////////////////// SharedCell ///////////////////////////////////////////

/// One shared integer, jointly owned by every worker for the duration of a
/// run.  The weak accessors are the moral equivalent of a plain `long` under
/// pthreads: each access is individually atomic, so a torn read cannot
/// happen, but a read-modify-write composed from them is *not* atomic and
/// carries no ordering relationship to any other shared state.  Lost updates
/// and stale reads between them are the phenomenon the no-lock experiment
/// exists to expose; do not strengthen these orderings.
pub struct SharedCell {
    value: AtomicI64,
}

impl SharedCell {
    /// Create a cell holding the initial value.
    pub fn new(value: i64) -> Self {
        Self {
            value: AtomicI64::new(value),
        }
    }

    /// Read the cell with no ordering guarantee.
    #[inline(always)]
    pub fn read_weak(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Overwrite the cell with no ordering guarantee.
    #[inline(always)]
    pub fn write_weak(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

////////////////////////////////////////// AnomalyCounters /////////////////////////////////////////

/// Run-scoped counters recording observed race symptoms.  Increments are
/// atomic regardless of whichever lock, if any, guards the cell, so the
/// counts are reliable under every policy.
pub struct AnomalyCounters {
    went_negative: AtomicU64,
    insufficient_funds: AtomicU64,
}

impl AnomalyCounters {
    /// Create counters at zero.
    pub fn new() -> Self {
        Self {
            went_negative: AtomicU64::new(0),
            insufficient_funds: AtomicU64::new(0),
        }
    }

    /// Record an observation of the cell below zero.
    pub fn click_went_negative(&self) {
        WENT_NEGATIVE.click();
        self.went_negative.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decrement skipped because the balance looked insufficient.
    pub fn click_insufficient_funds(&self) {
        INSUFFICIENT_FUNDS.click();
        self.insufficient_funds.fetch_add(1, Ordering::Relaxed);
    }

    /// An immutable copy of the counts.  Only meaningful once every worker
    /// has terminated.
    pub fn snapshot(&self) -> AnomalySnapshot {
        AnomalySnapshot {
            went_negative: self.went_negative.load(Ordering::Relaxed),
            insufficient_funds: self.insufficient_funds.load(Ordering::Relaxed),
        }
    }
}

impl Default for AnomalyCounters {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////// AnomalySnapshot /////////////////////////////////////////

/// A point-in-time copy of [AnomalyCounters].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AnomalySnapshot {
    /// How many times a worker observed the cell below zero after its own
    /// subtraction.
    pub went_negative: u64,
    /// How many decrements were skipped because the balance looked
    /// insufficient.
    pub insufficient_funds: u64,
}

impl AnomalySnapshot {
    /// True iff no anomaly was recorded.
    pub fn is_clean(&self) -> bool {
        self.went_negative == 0 && self.insufficient_funds == 0
    }
}

/////////////////////////////////////////////// tests //////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_read_write() {
        let cell = SharedCell::new(42);
        assert_eq!(42, cell.read_weak());
        cell.write_weak(-7);
        assert_eq!(-7, cell.read_weak());
    }

    #[test]
    fn counters_start_clean() {
        let counters = AnomalyCounters::new();
        assert!(counters.snapshot().is_clean());
    }

    #[test]
    fn counters_click() {
        let counters = AnomalyCounters::new();
        counters.click_went_negative();
        counters.click_insufficient_funds();
        counters.click_insufficient_funds();
        let snapshot = counters.snapshot();
        assert_eq!(1, snapshot.went_negative);
        assert_eq!(2, snapshot.insufficient_funds);
        assert!(!snapshot.is_clean());
    }
}
