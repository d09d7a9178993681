//! Storage infrastructure: settings persistence and the configuration file.
//!
//! - `file_store`: a [`SettingsStore`](deflayer_core::SettingsStore) that keeps
//!   each key in its own file, written atomically.
//! - `memory_store`: the same trait over a `BTreeMap`, with failure injection
//!   for tests and the `--ephemeral` mode.
//! - `config`: the TOML configuration file, with defaults for every field so a
//!   first run needs no file at all.

pub mod config;
pub mod file_store;
pub mod memory_store;
