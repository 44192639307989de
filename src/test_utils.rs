use std::sync::{Mutex, MutexGuard, OnceLock};

/// Global lock for process-wide state changes in tests.
/// All tests that flip the SIGCHLD disposition or sweep the process table
/// should acquire this lock to prevent interference between parallel test
/// executions.
pub static DISPOSITION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub fn disposition_lock() -> MutexGuard<'static, ()> {
    DISPOSITION_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
