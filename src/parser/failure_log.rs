//! Bounded in-memory log of unparseable lines.
//!
//! The one piece of process-wide state in the crate: a ring buffer of the
//! most recent parse failures, exposed for telemetry. Thread-safe, and
//! resettable so tests can isolate themselves.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum retained failure lines.
pub const FAILURE_LOG_CAPACITY: usize = 100;

static FAILURES: Mutex<VecDeque<String>> = Mutex::new(VecDeque::new());

/// Records one failed line, evicting the oldest entry when full.
pub fn record_failure(line: &str) {
    let mut log = FAILURES.lock().expect("failure log poisoned");
    if log.len() == FAILURE_LOG_CAPACITY {
        log.pop_front();
    }
    log.push_back(line.to_string());
}

/// The retained failures, oldest first.
pub fn recent_failures() -> Vec<String> {
    FAILURES.lock().expect("failure log poisoned").iter().cloned().collect()
}

/// Clears the log. Tests call this before exercising the parser.
pub fn reset_failure_log() {
    FAILURES.lock().expect("failure log poisoned").clear();
}
