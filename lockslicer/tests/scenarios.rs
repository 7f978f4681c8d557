use lockslicer::{Configuration, Harness, PolicyKind, Report};

fn run(
    policy: PolicyKind,
    threads: u64,
    iterations: u64,
    amount: i64,
    initial: Option<i64>,
) -> Report {
    let config = Configuration::new(policy, threads, iterations, amount, initial, 0)
        .expect("configuration should be valid");
    Harness::new(config)
        .run()
        .expect("run should produce a report")
}

#[test]
fn single_lock_is_exact() {
    let report = run(PolicyKind::SingleLock, 4, 100_000, 0, Some(0));
    assert_eq!(400_000, report.final_value);
    assert_eq!(400_000, report.expected_value);
    assert!(report.is_exact());
    assert!(report.anomalies.is_clean());
    assert!(report.elapsed_seconds >= 0.0);
}

#[test]
fn single_lock_holds_for_one_thread() {
    let report = run(PolicyKind::SingleLock, 1, 1_000, 0, Some(0));
    assert_eq!(1_000, report.final_value);
    assert!(report.is_exact());
}

#[test]
fn double_lock_completes_and_is_exact() {
    // Completion here is itself part of the property:  the fixed
    // first-then-second order must never deadlock.
    let report = run(PolicyKind::DoubleLock, 4, 50_000, 0, Some(0));
    assert_eq!(200_000, report.final_value);
    assert_eq!(200_000, report.expected_value);
    assert!(report.anomalies.is_clean());
}

#[test]
fn locked_runs_are_deterministic() {
    for policy in [PolicyKind::SingleLock, PolicyKind::DoubleLock] {
        let first = run(policy, 3, 1_000, 0, Some(0));
        for _ in 0..4 {
            let again = run(policy, 3, 1_000, 0, Some(0));
            assert_eq!(first.final_value, again.final_value);
            assert_eq!(first.expected_value, again.expected_value);
        }
    }
}

#[test]
fn useless_lock_completes_without_touching_cell() {
    let report = run(PolicyKind::UselessLock, 4, 10_000, 0, Some(0));
    assert_eq!(0, report.final_value);
    assert_eq!(0, report.expected_value);
    assert!(report.anomalies.is_clean());
}

#[test]
fn no_lock_anomalies_are_data_not_failures() {
    // Races are probabilistic, so this asserts only what is guaranteed:  the
    // expectation math, the anomaly-count invariants, and completion.  It
    // never asserts that the race fired.
    let report = run(PolicyKind::NoLock, 8, 10_000, 10, None);
    assert_eq!(800_000, report.initial_value);
    assert_eq!(0, report.expected_value);
    if report.final_value < 0 {
        assert!(report.anomalies.went_negative >= 1);
    }
    let attempts = report.thread_count * report.iterations_per_thread;
    assert!(report.anomalies.insufficient_funds <= attempts);
    assert!(report.anomalies.went_negative <= attempts);
}

#[test]
fn no_lock_single_thread_counts_skips_exactly() {
    // With one worker there is no race:  25 covers two withdrawals of 10,
    // and the remaining eight attempts each click insufficient_funds once.
    let report = run(PolicyKind::NoLock, 1, 10, 10, Some(25));
    assert_eq!(5, report.final_value);
    assert_eq!(8, report.anomalies.insufficient_funds);
    assert_eq!(0, report.anomalies.went_negative);
}

#[test]
fn no_lock_single_thread_zero_sum() {
    let report = run(PolicyKind::NoLock, 1, 5, 10, None);
    assert_eq!(50, report.initial_value);
    assert_eq!(0, report.final_value);
    assert_eq!(0, report.expected_value);
    assert!(report.is_exact());
    assert!(report.anomalies.is_clean());
}

#[test]
fn zero_iterations_leaves_initial_under_every_policy() {
    for policy in [
        PolicyKind::NoLock,
        PolicyKind::SingleLock,
        PolicyKind::UselessLock,
        PolicyKind::DoubleLock,
    ] {
        let report = run(policy, 1, 0, 10, Some(5));
        assert_eq!(5, report.final_value, "policy {}", policy);
        assert!(report.anomalies.is_clean(), "policy {}", policy);
    }
}

#[test]
fn configuration_requires_a_thread() {
    assert!(Configuration::new(PolicyKind::NoLock, 0, 1, 10, None, 0).is_err());
}
