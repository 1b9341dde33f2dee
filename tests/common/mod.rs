#![allow(dead_code)]

pub use simherd_test_utils::builders;
pub use simherd_test_utils::fake_solver;
pub use simherd_test_utils::{init_tracing, with_timeout};

use std::sync::{Mutex, MutexGuard};

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Serialise tests that enter a workspace.
///
/// The working directory is process-wide state, and the test harness runs
/// tests on multiple threads.
pub fn cwd_lock() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
