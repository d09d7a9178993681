//! Simulated keymap.
//!
//! Stands in for the firmware keymap on a host: it has a fixed number of
//! layers and remembers which one was activated last.  Activating a layer
//! replaces the previous one, matching the "single default layer" semantics
//! the controller relies on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use deflayer_core::LayerIndex;
use tracing::trace;

use crate::application::apply_layer::{Keymap, KeymapError};
use crate::infrastructure::lock;

/// A [`Keymap`] with `layer_count` layers and one active layer.
pub struct SimulatedKeymap {
    layer_count: u8,
    active: Mutex<LayerIndex>,
    activations: AtomicUsize,
}

impl SimulatedKeymap {
    /// Creates a keymap with `layer_count` layers, layer 0 active.
    pub fn new(layer_count: u8) -> Self {
        Self {
            layer_count,
            active: Mutex::new(0),
            activations: AtomicUsize::new(0),
        }
    }

    /// Returns the currently active layer.
    pub fn active_layer(&self) -> LayerIndex {
        *lock(&self.active)
    }

    /// Number of successful activations so far.
    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::Relaxed)
    }
}

impl Keymap for SimulatedKeymap {
    fn layer_count(&self) -> u8 {
        self.layer_count
    }

    fn activate_layer(&self, layer: LayerIndex) -> Result<(), KeymapError> {
        if layer >= self.layer_count {
            return Err(KeymapError::LayerOutOfRange {
                layer,
                layer_count: self.layer_count,
            });
        }
        *lock(&self.active) = layer;
        self.activations.fetch_add(1, Ordering::Relaxed);
        trace!("keymap: layer {layer} active");
        Ok(())
    }
}
