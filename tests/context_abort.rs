use std::process::Command;

use simgpi::{ContextGuard, SimContext};

const CHILD_ENV: &str = "SIMGPI_CONTEXT_CHILD";

#[test]
fn double_to_user_terminates_process() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let guard = ContextGuard::new();
        guard.to_user();
        guard.to_user();
        // Only reached if the violation went unnoticed.
        std::process::exit(0);
    }

    let exe = std::env::current_exe().unwrap();
    let status = Command::new(exe)
        .args(["double_to_user_terminates_process", "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .status()
        .unwrap();
    assert!(!status.success(), "child survived a context violation: {status}");
}

#[test]
fn violation_is_reported_by_checked_transitions() {
    let guard = ContextGuard::new();
    guard.try_to_user().unwrap();

    let violation = guard.try_to_user().unwrap_err();
    assert_eq!(violation.current, SimContext::User);
    assert_eq!(violation.requested, SimContext::User);
    // A refused transition leaves the token where it was.
    assert_eq!(guard.current(), SimContext::User);

    guard.try_to_simulator().unwrap();
    assert!(guard.try_to_simulator().is_err());
}
