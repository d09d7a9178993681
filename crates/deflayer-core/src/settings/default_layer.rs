//! Persistence adapter for the default-layer table.
//!
//! The table lives under the `default_layer` namespace as one blob stored at
//! `default_layer/settings`.  Every save writes the complete table, so the
//! stored value is always a full snapshot and never a mix of old and new
//! entries.

use tracing::{debug, warn};

use super::{join_key, SettingsStore, StoreError};
use crate::domain::table::{DefaultLayerTable, TableError};

/// Namespace owned by the default-layer handler.
pub const NAMESPACE: &str = "default_layer";

/// Key (relative to [`NAMESPACE`]) holding the table blob.
pub const SETTINGS_KEY: &str = "settings";

/// Bridges [`DefaultLayerTable`] onto a [`SettingsStore`].
pub struct DefaultLayerSettings;

impl DefaultLayerSettings {
    /// Returns the full store key of the table blob.
    pub fn blob_key() -> String {
        join_key(NAMESPACE, SETTINGS_KEY)
    }

    /// Registers the [`NAMESPACE`] handler with `store`.
    ///
    /// # Errors
    ///
    /// Propagates the store's registration error.
    pub fn register(store: &dyn SettingsStore) -> Result<(), StoreError> {
        store.register(NAMESPACE)
    }

    /// Loads the stored table, if a valid one exists.
    ///
    /// Returns `Ok(None)` when nothing is stored or when the stored blob has the
    /// wrong size; a size mismatch means the blob predates the current table
    /// layout and is ignored rather than treated as corruption.  Keys other than
    /// [`SETTINGS_KEY`] are not ours and are skipped.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub fn load(store: &dyn SettingsStore) -> Result<Option<DefaultLayerTable>, StoreError> {
        let mut loaded = None;

        store.load_subtree(NAMESPACE, &mut |key: &str, value: &[u8]| {
            if key != SETTINGS_KEY {
                debug!("ignoring unknown settings key `{NAMESPACE}/{key}`");
                return;
            }
            match DefaultLayerTable::from_blob(value) {
                Ok(table) => loaded = Some(table),
                Err(TableError::InvalidLength { expected, actual }) => {
                    warn!(
                        "discarding stored default layers: blob is {actual} bytes, expected {expected}"
                    );
                }
                Err(e) => warn!("discarding stored default layers: {e}"),
            }
        })?;

        Ok(loaded)
    }

    /// Writes the whole table under [`DefaultLayerSettings::blob_key`].
    ///
    /// # Errors
    ///
    /// Returns the store's write error.  A warning is logged; the caller is
    /// expected neither to retry nor to roll back its in-memory table.
    pub fn save(store: &dyn SettingsStore, table: &DefaultLayerTable) -> Result<(), StoreError> {
        let key = Self::blob_key();
        let result = table
            .to_blob()
            .map_err(|e| StoreError::Write {
                key: key.clone(),
                reason: e.to_string(),
            })
            .and_then(|blob| store.save_one(&key, &blob));

        if let Err(e) = &result {
            warn!("could not update the settings: {e}");
        }
        result
    }
}
