//! Shared test utilities for the agent crate.

use std::sync::{Mutex, MutexGuard, OnceLock};

/// Process-global lock for tests that read or modify the live environment.
///
/// `setenv` may reallocate `environ` under a concurrent reader, so every
/// test that touches the process environment must hold this lock.
pub fn lock_environment() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}
