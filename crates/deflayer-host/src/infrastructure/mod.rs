//! Infrastructure layer for the host application.
//!
//! Contains the adapters behind the application traits: settings stores
//! (file and in-memory), the simulated keymap and endpoint subsystem, the
//! TOML config file, and the line-oriented event script the binary runs.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `deflayer_core`, but MUST NOT be imported by the `application` or domain
//! layers outside of tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod endpoints;
pub mod keymap;
pub mod script;
pub mod storage;

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// Every value guarded in this layer stays consistent across a panic (each
/// critical section is a single insert or assignment), so poisoning carries no
/// information worth propagating.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
