//! Settings persistence contract.
//!
//! The durable store is an external key-value subsystem addressed by
//! hierarchical, `/`-separated string keys (`"default_layer/settings"`).
//! Handlers register a top-level *namespace*, ask the store to replay every
//! key stored below it at boot, and write single keys back when state changes.
//!
//! The [`SettingsStore`] trait is the seam: production code would wrap the
//! firmware's settings subsystem, the host crate provides a file-backed and an
//! in-memory implementation.  [`DefaultLayerSettings`] is the adapter that
//! bridges the default-layer table onto that contract.

use thiserror::Error;

pub mod default_layer;

pub use default_layer::DefaultLayerSettings;

/// Separator between the segments of a settings key.
pub const KEY_SEPARATOR: char = '/';

/// Errors reported by a [`SettingsStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store has not been initialised (or initialisation failed).
    #[error("settings store is not initialised")]
    NotInitialised,

    /// A handler for this namespace already exists.
    #[error("namespace `{0}` is already registered")]
    AlreadyRegistered(String),

    /// The namespace was never registered.
    #[error("namespace `{0}` is not registered")]
    NotRegistered(String),

    /// The key is empty, has empty segments, or contains forbidden characters.
    #[error("invalid settings key `{0}`")]
    InvalidKey(String),

    /// Reading a stored value failed.
    #[error("failed to read `{key}`: {reason}")]
    Read { key: String, reason: String },

    /// Writing a value failed.
    #[error("failed to write `{key}`: {reason}")]
    Write { key: String, reason: String },
}

/// Durable hierarchical key-value store.
///
/// All calls are synchronous and complete before returning.
pub trait SettingsStore {
    /// Prepares the store for use.  Calling it more than once is harmless.
    fn init(&self) -> Result<(), StoreError>;

    /// Registers a handler namespace.
    fn register(&self, namespace: &str) -> Result<(), StoreError>;

    /// Replays every key stored under `namespace`.
    ///
    /// `visit` is called once per stored key with the key relative to the
    /// namespace (`"settings"` for `"default_layer/settings"`) and the raw
    /// stored bytes.
    fn load_subtree(
        &self,
        namespace: &str,
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<(), StoreError>;

    /// Stores `value` under the full key `key`, replacing any previous value.
    fn save_one(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Joins key segments with [`KEY_SEPARATOR`].
pub fn join_key(namespace: &str, name: &str) -> String {
    format!("{namespace}{KEY_SEPARATOR}{name}")
}

/// Checks that `key` is a well-formed settings key.
///
/// Segments must be non-empty and may only contain ASCII alphanumerics,
/// `_` and `-`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] if any segment is malformed.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.split(KEY_SEPARATOR).all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
