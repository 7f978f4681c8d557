//! The runnable form of a synchronization policy: the policy's identity plus
//! the lock set it owns.  Which code lies inside each critical section is the
//! experimental variable, so the worker bodies in [crate::harness] match on
//! this enum directly rather than funneling through a normalized lock
//! interface that would blur the boundaries.

use std::sync::Mutex;

use crate::PolicyKind;

////////////////////////////////////////////// Policy //////////////////////////////////////////////

/// A policy and its locks, created fresh for each run.  Locks are scoped
/// guards, so release happens on every exit path from a critical section.
pub enum Policy {
    /// No lock exists.  Workers never block on shared state.
    NoLock,
    /// The guarded operation executes entirely inside this lock.
    SingleLock {
        /// The only lock.
        lock: Mutex<()>,
    },
    /// The lock guards a fixed amount of purely local computation.
    UselessLock {
        /// The lock that guards nothing shared.
        lock: Mutex<()>,
    },
    /// Two locks acquired first-then-second in every worker.  The uniform
    /// order is the sole deadlock-avoidance mechanism; there is no other.
    DoubleLock {
        /// Always acquired first.
        first: Mutex<()>,
        /// Always acquired second, released first.
        second: Mutex<()>,
    },
}

impl Policy {
    /// Instantiate the lock set for the named policy.
    pub fn new(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::NoLock => Policy::NoLock,
            PolicyKind::SingleLock => Policy::SingleLock {
                lock: Mutex::new(()),
            },
            PolicyKind::UselessLock => Policy::UselessLock {
                lock: Mutex::new(()),
            },
            PolicyKind::DoubleLock => Policy::DoubleLock {
                first: Mutex::new(()),
                second: Mutex::new(()),
            },
        }
    }

    /// The name of this policy.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::NoLock => PolicyKind::NoLock,
            Policy::SingleLock { .. } => PolicyKind::SingleLock,
            Policy::UselessLock { .. } => PolicyKind::UselessLock,
            Policy::DoubleLock { .. } => PolicyKind::DoubleLock,
        }
    }
}

/////////////////////////////////////////////// tests //////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips() {
        for kind in [
            PolicyKind::NoLock,
            PolicyKind::SingleLock,
            PolicyKind::UselessLock,
            PolicyKind::DoubleLock,
        ] {
            assert_eq!(kind, Policy::new(kind).kind());
        }
    }
}
