//! In-memory settings store.
//!
//! Keeps every value in a `BTreeMap` behind a `Mutex`.  Nothing survives the
//! process, which makes it the store of choice for unit tests and for the
//! host binary's `--ephemeral` mode.
//!
//! # Failure injection
//!
//! [`MemorySettingsStore::set_fail_reads`] and
//! [`MemorySettingsStore::set_fail_writes`] make subsequent loads or saves
//! return an error, so callers' error paths can be tested without a broken
//! disk.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use deflayer_core::settings::{validate_key, KEY_SEPARATOR};
use deflayer_core::{SettingsStore, StoreError};

use crate::infrastructure::lock;

/// A [`SettingsStore`] that keeps values in memory.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, Vec<u8>>>,
    namespaces: Mutex<Vec<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemorySettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key` directly, bypassing validation and the
    /// save counter.  Used to seed a store with pre-existing data.
    pub fn insert(&self, key: &str, value: Vec<u8>) {
        lock(&self.values).insert(key.to_string(), value);
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.values).get(key).cloned()
    }

    /// Number of successful [`SettingsStore::save_one`] calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// When `true`, every subsequent `load_subtree` fails with [`StoreError::Read`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// When `true`, every subsequent `save_one` fails with [`StoreError::Write`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
}

impl SettingsStore for MemorySettingsStore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn register(&self, namespace: &str) -> Result<(), StoreError> {
        validate_key(namespace)?;
        let mut namespaces = lock(&self.namespaces);
        if namespaces.iter().any(|n| n == namespace) {
            return Err(StoreError::AlreadyRegistered(namespace.to_string()));
        }
        namespaces.push(namespace.to_string());
        Ok(())
    }

    fn load_subtree(
        &self,
        namespace: &str,
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<(), StoreError> {
        if !lock(&self.namespaces).iter().any(|n| n == namespace) {
            return Err(StoreError::NotRegistered(namespace.to_string()));
        }
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StoreError::Read {
                key: namespace.to_string(),
                reason: "injected read failure".into(),
            });
        }

        // Snapshot first so `visit` may call back into the store.
        let prefix = format!("{namespace}{KEY_SEPARATOR}");
        let entries: Vec<(String, Vec<u8>)> = lock(&self.values)
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|relative| (relative.to_string(), value.clone()))
            })
            .collect();

        for (relative, value) in &entries {
            visit(relative, value);
        }
        Ok(())
    }

    fn save_one(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "injected write failure".into(),
            });
        }
        lock(&self.values).insert(key.to_string(), value.to_vec());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
