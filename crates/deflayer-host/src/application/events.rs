//! Device event dispatch.
//!
//! The firmware delivers two kinds of events to the default-layer feature:
//! key binding transitions (routed by the behaviour dispatcher) and
//! endpoint-changed notifications (delivered by the event bus).  [`dispatch`]
//! is the single entry point that routes a [`DeviceEvent`] to the matching
//! controller handler and reports what the caller should do next.

use deflayer_core::EndpointDescriptor;
use tracing::debug;

use super::controller::{BindingOutcome, ControllerError, DefaultLayerController, EventPropagation};

/// An event the default-layer feature reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The "set default layer" binding was pressed with its raw parameter.
    BindingPressed { param: u32 },
    /// The binding was released.
    BindingReleased,
    /// The output endpoint changed to the given one.
    EndpointChanged(EndpointDescriptor),
}

/// How the event source should continue after [`dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Result for a binding event.
    Binding(BindingOutcome),
    /// Result for an event-bus notification.
    Listener(EventPropagation),
}

/// Routes `event` to `controller`.
///
/// # Errors
///
/// Propagates the controller's error for a failed binding press.  Endpoint
/// changes never fail.
pub fn dispatch(
    controller: &mut DefaultLayerController,
    event: DeviceEvent,
) -> Result<DispatchOutcome, ControllerError> {
    debug!("dispatching {event:?}");
    match event {
        DeviceEvent::BindingPressed { param } => {
            controller.on_binding_pressed(param)?;
            Ok(DispatchOutcome::Binding(BindingOutcome::Opaque))
        }
        DeviceEvent::BindingReleased => {
            Ok(DispatchOutcome::Binding(controller.on_binding_released()))
        }
        DeviceEvent::EndpointChanged(endpoint) => Ok(DispatchOutcome::Listener(
            controller.on_endpoint_changed(endpoint),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use deflayer_core::{EndpointIdentity, TableError};
    use mockall::predicate::eq;

    use super::*;
    use crate::application::apply_layer::MockKeymap;
    use crate::application::controller::MockEndpointSelector;
    use crate::infrastructure::storage::memory_store::MemorySettingsStore;

    fn controller(keymap: MockKeymap) -> DefaultLayerController {
        let mut endpoints = MockEndpointSelector::new();
        endpoints
            .expect_selected()
            .return_const(EndpointDescriptor::usb());
        DefaultLayerController::new(
            Arc::new(MemorySettingsStore::new()),
            Arc::new(keymap),
            Arc::new(endpoints),
        )
    }

    #[test]
    fn test_pressed_is_opaque_and_updates_table() {
        // Arrange
        let mut keymap = MockKeymap::new();
        keymap.expect_layer_count().return_const(8u8);
        keymap
            .expect_activate_layer()
            .with(eq(6))
            .times(1)
            .returning(|_| Ok(()));
        let mut controller = controller(keymap);

        // Act
        let outcome = dispatch(&mut controller, DeviceEvent::BindingPressed { param: 6 });

        // Assert
        assert_eq!(outcome, Ok(DispatchOutcome::Binding(BindingOutcome::Opaque)));
        assert_eq!(controller.table().get(EndpointIdentity::Wired), 6);
    }

    #[test]
    fn test_pressed_with_invalid_param_propagates_error() {
        let mut keymap = MockKeymap::new();
        keymap.expect_layer_count().return_const(2u8);
        keymap.expect_activate_layer().never();
        let mut controller = controller(keymap);

        let outcome = dispatch(&mut controller, DeviceEvent::BindingPressed { param: 9 });

        assert_eq!(
            outcome,
            Err(ControllerError::InvalidLayer(TableError::InvalidLayer {
                layer: 9,
                layer_count: 2
            }))
        );
    }

    #[test]
    fn test_released_is_opaque() {
        let mut controller = controller(MockKeymap::new());

        let outcome = dispatch(&mut controller, DeviceEvent::BindingReleased);

        assert_eq!(outcome, Ok(DispatchOutcome::Binding(BindingOutcome::Opaque)));
    }

    #[test]
    fn test_endpoint_changed_bubbles() {
        let mut keymap = MockKeymap::new();
        keymap.expect_layer_count().return_const(8u8);
        keymap
            .expect_activate_layer()
            .with(eq(0))
            .times(1)
            .returning(|_| Ok(()));
        let mut controller = controller(keymap);

        let outcome = dispatch(
            &mut controller,
            DeviceEvent::EndpointChanged(EndpointDescriptor::ble(3)),
        );

        assert_eq!(outcome, Ok(DispatchOutcome::Listener(EventPropagation::Bubble)));
    }
}
