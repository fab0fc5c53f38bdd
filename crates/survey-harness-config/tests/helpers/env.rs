// crates/survey-harness-config/tests/helpers/env.rs
// ============================================================================
// Module: Test Environment Helpers
// Description: Serialized wrappers for test-only process state mutation.
// Purpose: Centralize env var and working directory changes with safety notes.
// ============================================================================

#![allow(unsafe_code, reason = "Test harness mutates process env for configuration.")]

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

/// Serializes tests that touch process-wide state.
static PROCESS_STATE: Mutex<()> = Mutex::new(());

/// Exclusive hold on the process environment and working directory.
///
/// Dropping the guard removes the variables it set and restores the
/// working directory it started from.
pub struct ProcessGuard {
    /// Variables set through this guard.
    vars: Vec<String>,
    /// Working directory at acquisition time.
    original_dir: PathBuf,
    /// Lock held for the guard's lifetime.
    _lock: MutexGuard<'static, ()>,
}

impl ProcessGuard {
    /// Waits for exclusive access to process state.
    pub fn acquire() -> Result<Self, String> {
        let lock = PROCESS_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        let original_dir = env::current_dir().map_err(|err| err.to_string())?;
        Ok(Self {
            vars: Vec::new(),
            original_dir,
            _lock: lock,
        })
    }

    /// Sets an environment variable until the guard drops.
    pub fn set_var(&mut self, key: &str, value: &str) {
        // SAFETY: The process-state lock is held, so no other test reads or writes env.
        unsafe {
            env::set_var(key, value);
        }
        self.vars.push(key.to_string());
    }

    /// Removes an environment variable from the current process.
    pub fn remove_var(&mut self, key: &str) {
        // SAFETY: The process-state lock is held, so no other test reads or writes env.
        unsafe {
            env::remove_var(key);
        }
    }

    /// Changes the working directory until the guard drops.
    pub fn set_current_dir(&mut self, dir: &Path) -> Result<(), String> {
        env::set_current_dir(dir).map_err(|err| err.to_string())
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        for key in &self.vars {
            // SAFETY: The process-state lock is still held while the guard drops.
            unsafe {
                env::remove_var(key);
            }
        }
        let _ = env::set_current_dir(&self.original_dir);
    }
}
