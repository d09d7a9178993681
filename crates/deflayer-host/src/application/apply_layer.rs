//! ApplyLayer: activates the remembered default layer for an endpoint.
//!
//! The applier looks the endpoint up in the [`DefaultLayerTable`] and asks the
//! [`Keymap`] collaborator to make that layer the single active layer.  It
//! depends only on the trait, so the keymap implementation is injected at
//! construction time.

use std::sync::Arc;

use deflayer_core::{DefaultLayerTable, EndpointIdentity, LayerIndex};
use thiserror::Error;
use tracing::{info, warn};

/// Errors reported by a [`Keymap`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeymapError {
    /// The keymap has no layer with this index.
    #[error("layer {layer} does not exist (keymap has {layer_count} layers)")]
    LayerOutOfRange { layer: LayerIndex, layer_count: u8 },
}

/// Error type for the apply-layer use case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// The keymap rejected the remembered layer, most likely because it was
    /// rebuilt with fewer layers after the value was saved.
    #[error("cannot activate layer {layer} for {endpoint}: {source}")]
    LayerOutOfRange {
        endpoint: EndpointIdentity,
        layer: LayerIndex,
        #[source]
        source: KeymapError,
    },
}

/// The keymap subsystem.
///
/// The infrastructure implementation switches layers on the device; tests use
/// a mock or [`crate::infrastructure::keymap::SimulatedKeymap`].
#[cfg_attr(test, mockall::automock)]
pub trait Keymap {
    /// Number of layers in the current keymap.
    fn layer_count(&self) -> u8;

    /// Makes `layer` the only active layer, replacing whatever was active.
    fn activate_layer(&self, layer: LayerIndex) -> Result<(), KeymapError>;
}

/// The Apply Layer use case.
pub struct LayerApplier {
    keymap: Arc<dyn Keymap>,
}

impl LayerApplier {
    /// Creates an applier driving `keymap`.
    pub fn new(keymap: Arc<dyn Keymap>) -> Self {
        Self { keymap }
    }

    /// Returns the keymap's current layer count.
    pub fn layer_count(&self) -> u8 {
        self.keymap.layer_count()
    }

    /// Activates the default layer remembered for `endpoint`.
    ///
    /// Returns the activated layer on success.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::LayerOutOfRange`] if the keymap rejects the layer.
    /// The failure is logged; the previously active layer stays active.
    pub fn apply(
        &self,
        endpoint: EndpointIdentity,
        table: &DefaultLayerTable,
    ) -> Result<LayerIndex, ApplyError> {
        let layer = table.get(endpoint);

        match self.keymap.activate_layer(layer) {
            Ok(()) => {
                info!("activated default layer ({layer}) for {endpoint}");
                Ok(layer)
            }
            Err(source) => {
                warn!(
                    "could not apply default layer ({layer}) for {endpoint}: {source}; \
                     perhaps the number of layers changed since it was saved"
                );
                Err(ApplyError::LayerOutOfRange {
                    endpoint,
                    layer,
                    source,
                })
            }
        }
    }
}
