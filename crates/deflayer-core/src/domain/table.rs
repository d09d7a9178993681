//! Default-layer table domain entity.
//!
//! The table remembers one keymap layer per endpoint.  It is the unit of
//! persisted state: the whole table is written to the settings store as a
//! single fixed-size blob and read back in one piece at boot.
//!
//! # Blob layout
//!
//! ```text
//! offset 0                 : wired[0]            (u8)
//! offset WIRED_COUNT + i   : wireless[i]         (u8, i < BLE_PROFILE_COUNT)
//! ```
//!
//! There is no header, version byte, or length prefix.  A blob of any other
//! length is rejected with [`TableError::InvalidLength`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::endpoint::{EndpointIdentity, BLE_PROFILE_COUNT, WIRED_COUNT};

/// Index of a keymap layer.  Valid values are below the keymap's layer count.
pub type LayerIndex = u8;

/// Exact size in bytes of a serialized [`DefaultLayerTable`].
pub const BLOB_LEN: usize = WIRED_COUNT + BLE_PROFILE_COUNT;

/// Errors produced by table mutation and blob decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The requested layer does not exist in the current keymap.
    #[error("invalid layer {layer}: keymap has {layer_count} layers")]
    InvalidLayer { layer: u32, layer_count: u8 },

    /// A stored blob does not have the size of a table.
    #[error("invalid blob length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The blob could not be encoded or decoded.
    #[error("table codec error: {0}")]
    Codec(String),
}

/// One remembered default layer per endpoint.
///
/// A fresh table maps every endpoint to layer 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLayerTable {
    wired: [LayerIndex; WIRED_COUNT],
    wireless: [LayerIndex; BLE_PROFILE_COUNT],
}

impl DefaultLayerTable {
    /// Creates a table with every entry at layer 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default layer remembered for `endpoint`.
    pub fn get(&self, endpoint: EndpointIdentity) -> LayerIndex {
        match endpoint {
            EndpointIdentity::Wired => self.wired[0],
            EndpointIdentity::Wireless(index) => self.wireless[index.as_usize()],
        }
    }

    /// Remembers `layer` as the default for `endpoint`.
    ///
    /// Only the in-memory entry changes; persisting the table is up to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidLayer`] if `layer >= layer_count`.  The
    /// table is left untouched in that case.
    pub fn set(
        &mut self,
        endpoint: EndpointIdentity,
        layer: u32,
        layer_count: u8,
    ) -> Result<(), TableError> {
        if layer >= u32::from(layer_count) {
            return Err(TableError::InvalidLayer { layer, layer_count });
        }
        // layer < layer_count <= u8::MAX, so the narrowing is lossless.
        let layer = layer as LayerIndex;

        match endpoint {
            EndpointIdentity::Wired => self.wired[0] = layer,
            EndpointIdentity::Wireless(index) => self.wireless[index.as_usize()] = layer,
        }
        Ok(())
    }

    /// Iterates over `(endpoint, layer)` pairs in blob order.
    pub fn entries(&self) -> impl Iterator<Item = (EndpointIdentity, LayerIndex)> + '_ {
        EndpointIdentity::all().map(move |endpoint| (endpoint, self.get(endpoint)))
    }

    /// Serializes the whole table into its fixed-size blob.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Codec`] if the encoder fails.
    pub fn to_blob(&self) -> Result<Vec<u8>, TableError> {
        let blob = bincode::serialize(self).map_err(|e| TableError::Codec(e.to_string()))?;
        debug_assert_eq!(blob.len(), BLOB_LEN);
        Ok(blob)
    }

    /// Deserializes a table from a stored blob.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidLength`] if `blob` is not exactly
    /// [`BLOB_LEN`] bytes, or [`TableError::Codec`] if decoding fails.
    pub fn from_blob(blob: &[u8]) -> Result<Self, TableError> {
        if blob.len() != BLOB_LEN {
            return Err(TableError::InvalidLength {
                expected: BLOB_LEN,
                actual: blob.len(),
            });
        }
        bincode::deserialize(blob).map_err(|e| TableError::Codec(e.to_string()))
    }
}
