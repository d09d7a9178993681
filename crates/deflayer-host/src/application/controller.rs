//! DefaultLayerController: reacts to key bindings and endpoint changes.
//!
//! The controller owns the single [`DefaultLayerTable`] for the process and
//! ties it to its collaborators:
//!
//! ```text
//! boot                 : init store → register → load → apply(selected endpoint)
//! binding pressed(L)   : table.set(selected, L) → save → apply(selected)
//! binding released     : no-op (opaque)
//! endpoint changed(E)  : apply(E)            (no save; event keeps bubbling)
//! ```
//!
//! Every entry point runs to completion before the next one starts and takes
//! `&mut self`, so the table needs no locking.

use std::sync::Arc;

use deflayer_core::{
    DefaultLayerSettings, DefaultLayerTable, EndpointDescriptor, EndpointIdentity, LayerIndex,
    SettingsStore, StoreError, TableError,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::apply_layer::{ApplyError, Keymap, LayerApplier};

const EIO: i32 = 5;
const ENOENT: i32 = 2;
const EINVAL: i32 = 22;
const EALREADY: i32 = 114;

/// Error type for the controller entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// `boot` was called a second time.
    #[error("default layer controller has already booted")]
    AlreadyBooted,

    /// The settings namespace could not be registered.
    #[error("could not register default layer settings: {0}")]
    Register(#[source] StoreError),

    /// The requested layer is outside the keymap.
    #[error(transparent)]
    InvalidLayer(TableError),

    /// The updated table could not be persisted.
    #[error("could not save default layers: {0}")]
    Save(#[source] StoreError),

    /// The keymap rejected the layer.
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl ControllerError {
    /// Negative errno-style code for callers that only propagate an integer.
    pub fn code(&self) -> i32 {
        match self {
            ControllerError::AlreadyBooted => -EALREADY,
            ControllerError::Register(e) | ControllerError::Save(e) => store_errno(e),
            ControllerError::InvalidLayer(_) | ControllerError::Apply(_) => -EINVAL,
        }
    }
}

fn store_errno(e: &StoreError) -> i32 {
    match e {
        StoreError::NotRegistered(_) => -ENOENT,
        StoreError::AlreadyRegistered(_) => -EALREADY,
        StoreError::InvalidKey(_) => -EINVAL,
        StoreError::NotInitialised | StoreError::Read { .. } | StoreError::Write { .. } => -EIO,
    }
}

/// What a key binding handler tells the binding dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
    /// The event was fully consumed; no other binding sees it.
    Opaque,
}

/// What an event listener tells the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPropagation {
    /// Keep delivering the event to other listeners.
    Bubble,
}

/// The endpoint subsystem: knows which endpoint is currently selected.
#[cfg_attr(test, mockall::automock)]
pub trait EndpointSelector {
    /// Returns the endpoint keystrokes are currently sent to.
    fn selected(&self) -> EndpointDescriptor;
}

/// Per-endpoint default layer controller.
pub struct DefaultLayerController {
    table: DefaultLayerTable,
    booted: bool,
    store: Arc<dyn SettingsStore>,
    endpoints: Arc<dyn EndpointSelector>,
    applier: LayerApplier,
}

impl DefaultLayerController {
    /// Creates a controller with an all-zero table.  Call [`boot`](Self::boot)
    /// once before handling events.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        keymap: Arc<dyn Keymap>,
        endpoints: Arc<dyn EndpointSelector>,
    ) -> Self {
        Self {
            table: DefaultLayerTable::new(),
            booted: false,
            store,
            endpoints,
            applier: LayerApplier::new(keymap),
        }
    }

    /// Returns the in-memory table.
    pub fn table(&self) -> &DefaultLayerTable {
        &self.table
    }

    /// Returns `true` once [`boot`](Self::boot) has run.
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Returns the currently selected endpoint.
    pub fn current_endpoint(&self) -> EndpointIdentity {
        EndpointIdentity::classify(self.endpoints.selected())
    }

    /// Initialises persistence, restores the stored table and activates the
    /// default layer of the selected endpoint.
    ///
    /// Load failures are logged and the all-zero table is kept.  A failed
    /// activation leaves the keymap on its power-on layer.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::AlreadyBooted`] on a second call.
    /// - [`ControllerError::Register`] if the namespace cannot be registered;
    ///   nothing is loaded or applied in that case.
    /// - [`ControllerError::Apply`] if the keymap rejects the restored layer.
    pub fn boot(&mut self) -> Result<LayerIndex, ControllerError> {
        if self.booted {
            return Err(ControllerError::AlreadyBooted);
        }
        self.booted = true;

        if let Err(e) = self.store.init() {
            warn!("settings store initialisation failed: {e}");
        }

        if let Err(e) = DefaultLayerSettings::register(self.store.as_ref()) {
            error!("could not register default layer settings ({e})");
            return Err(ControllerError::Register(e));
        }

        match DefaultLayerSettings::load(self.store.as_ref()) {
            Ok(Some(table)) => {
                debug!("restored default layers: {table:?}");
                self.table = table;
            }
            Ok(None) => debug!("no stored default layers; every endpoint uses layer 0"),
            Err(e) => warn!("could not load default layers, using layer 0 everywhere: {e}"),
        }

        let endpoint = self.current_endpoint();
        Ok(self.applier.apply(endpoint, &self.table)?)
    }

    /// Handles the "set default layer" binding being pressed.
    ///
    /// Remembers `layer` for the selected endpoint, persists the whole table,
    /// then activates it.  Returns the activated layer.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::InvalidLayer`] if `layer` is outside the keymap;
    ///   the table is unchanged.
    /// - [`ControllerError::Save`] if the store write fails; the in-memory
    ///   entry keeps the new value and nothing is activated.
    /// - [`ControllerError::Apply`] if the keymap rejects the layer.
    pub fn on_binding_pressed(&mut self, layer: u32) -> Result<LayerIndex, ControllerError> {
        let endpoint = self.current_endpoint();
        let layer_count = self.applier.layer_count();

        if let Err(e) = self.table.set(endpoint, layer, layer_count) {
            warn!("rejected default layer ({layer}) for {endpoint}: {e}");
            return Err(ControllerError::InvalidLayer(e));
        }

        DefaultLayerSettings::save(self.store.as_ref(), &self.table)
            .map_err(ControllerError::Save)?;
        info!("updated default layer ({layer}) for {endpoint}");

        Ok(self.applier.apply(endpoint, &self.table)?)
    }

    /// Handles the binding being released.  The press already did all the work.
    pub fn on_binding_released(&self) -> BindingOutcome {
        BindingOutcome::Opaque
    }

    /// Handles an endpoint-changed notification by activating the new
    /// endpoint's default layer.  The table is neither changed nor saved.
    ///
    /// Activation failures are logged by the applier; the event always keeps
    /// propagating.
    pub fn on_endpoint_changed(&self, endpoint: EndpointDescriptor) -> EventPropagation {
        let endpoint = EndpointIdentity::classify(endpoint);
        debug!("endpoint changed to {endpoint}");
        let _ = self.applier.apply(endpoint, &self.table);
        EventPropagation::Bubble
    }
}
