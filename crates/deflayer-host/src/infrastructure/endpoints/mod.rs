//! Simulated endpoint subsystem.
//!
//! Holds the currently selected output endpoint.  The host binary changes it
//! through [`SimulatedEndpoints::select`] and then notifies the controller,
//! the same way the firmware raises an endpoint-changed event after the user
//! switches between USB and a BLE profile.

use std::sync::Mutex;

use deflayer_core::{EndpointDescriptor, Transport, BLE_PROFILE_COUNT};
use thiserror::Error;

use crate::application::controller::EndpointSelector;
use crate::infrastructure::lock;

/// Errors from selecting an endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The BLE profile index does not exist.
    #[error("BLE profile {index} does not exist (profiles 0..{BLE_PROFILE_COUNT})")]
    NoSuchProfile { index: u8 },
}

/// An [`EndpointSelector`] whose selection is set by the caller.
pub struct SimulatedEndpoints {
    selected: Mutex<EndpointDescriptor>,
}

impl SimulatedEndpoints {
    /// Creates the subsystem with `initial` selected.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::NoSuchProfile`] if `initial` names a BLE
    /// profile outside the supported range.
    pub fn new(initial: EndpointDescriptor) -> Result<Self, EndpointError> {
        check(initial)?;
        Ok(Self {
            selected: Mutex::new(initial),
        })
    }

    /// Selects `endpoint`.  Returns `true` if the selection changed.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::NoSuchProfile`] for an unknown BLE profile;
    /// the selection is left as it was.
    pub fn select(&self, endpoint: EndpointDescriptor) -> Result<bool, EndpointError> {
        check(endpoint)?;
        let mut selected = lock(&self.selected);
        let changed = *selected != endpoint;
        *selected = endpoint;
        Ok(changed)
    }
}

impl EndpointSelector for SimulatedEndpoints {
    fn selected(&self) -> EndpointDescriptor {
        *lock(&self.selected)
    }
}

fn check(endpoint: EndpointDescriptor) -> Result<(), EndpointError> {
    if endpoint.transport == Transport::Ble
        && usize::from(endpoint.ble_profile_index) >= BLE_PROFILE_COUNT
    {
        return Err(EndpointError::NoSuchProfile {
            index: endpoint.ble_profile_index,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_reports_whether_selection_changed() {
        // Arrange
        let endpoints = SimulatedEndpoints::new(EndpointDescriptor::usb()).unwrap();

        // Act / Assert
        assert_eq!(endpoints.select(EndpointDescriptor::ble(1)), Ok(true));
        assert_eq!(endpoints.select(EndpointDescriptor::ble(1)), Ok(false));
        assert_eq!(endpoints.selected(), EndpointDescriptor::ble(1));
    }

    #[test]
    fn test_select_rejects_unknown_profile_and_keeps_selection() {
        let endpoints = SimulatedEndpoints::new(EndpointDescriptor::ble(0)).unwrap();
        let bad = BLE_PROFILE_COUNT as u8;

        let result = endpoints.select(EndpointDescriptor::ble(bad));

        assert_eq!(result, Err(EndpointError::NoSuchProfile { index: bad }));
        assert_eq!(endpoints.selected(), EndpointDescriptor::ble(0));
    }

    #[test]
    fn test_new_rejects_unknown_initial_profile() {
        assert!(SimulatedEndpoints::new(EndpointDescriptor::ble(200)).is_err());
    }
}
