//! Endpoint identity domain entity.
//!
//! An *endpoint* is the logical output channel keystrokes are currently sent
//! through: the single USB (wired) channel, or one of several BLE profiles.
//! The transport layer reports endpoints as a loosely typed descriptor; this
//! module classifies that descriptor into the closed [`EndpointIdentity`] type
//! used everywhere else.

use std::fmt;

/// Number of wired channels. There is exactly one USB endpoint.
pub const WIRED_COUNT: usize = 1;

/// Number of independently addressable BLE profiles.
pub const BLE_PROFILE_COUNT: usize = 5;

/// Transport kind as reported by the endpoint subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Usb,
    Ble,
}

/// Opaque endpoint instance handed over by the transport layer.
///
/// `ble_profile_index` is only meaningful when `transport` is [`Transport::Ble`].
/// The transport layer guarantees it is below [`BLE_PROFILE_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointDescriptor {
    pub transport: Transport,
    pub ble_profile_index: u8,
}

impl EndpointDescriptor {
    /// Descriptor for the USB endpoint.
    pub fn usb() -> Self {
        Self {
            transport: Transport::Usb,
            ble_profile_index: 0,
        }
    }

    /// Descriptor for BLE profile `index`.
    pub fn ble(index: u8) -> Self {
        Self {
            transport: Transport::Ble,
            ble_profile_index: index,
        }
    }
}

/// Index of a BLE profile, always below [`BLE_PROFILE_COUNT`].
///
/// The field is private so the bound holds for every value in existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileIndex(u8);

impl ProfileIndex {
    /// Returns `None` if `index >= BLE_PROFILE_COUNT`.
    pub fn new(index: u8) -> Option<Self> {
        if (index as usize) < BLE_PROFILE_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the raw profile number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Returns the profile number as an array index.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every valid profile index in ascending order.
    pub fn all() -> impl Iterator<Item = ProfileIndex> {
        (0..BLE_PROFILE_COUNT as u8).map(ProfileIndex)
    }
}

/// Which output channel an input event is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointIdentity {
    /// The single USB channel.
    Wired,
    /// One of the BLE profiles.
    Wireless(ProfileIndex),
}

impl EndpointIdentity {
    /// Classifies a transport descriptor.
    ///
    /// # Panics
    ///
    /// Panics if a BLE descriptor carries a profile index outside
    /// `[0, BLE_PROFILE_COUNT)`. The transport layer validates the index
    /// before publishing it, so this only fires on a bug in that layer.
    pub fn classify(descriptor: EndpointDescriptor) -> Self {
        match descriptor.transport {
            Transport::Usb => EndpointIdentity::Wired,
            Transport::Ble => match ProfileIndex::new(descriptor.ble_profile_index) {
                Some(index) => EndpointIdentity::Wireless(index),
                None => panic!(
                    "BLE profile index {} out of range (profiles: {BLE_PROFILE_COUNT})",
                    descriptor.ble_profile_index
                ),
            },
        }
    }

    /// Iterates over every endpoint: the wired channel first, then each BLE profile.
    pub fn all() -> impl Iterator<Item = EndpointIdentity> {
        std::iter::once(EndpointIdentity::Wired)
            .chain(ProfileIndex::all().map(EndpointIdentity::Wireless))
    }

    /// Converts back into the transport-layer descriptor.
    pub fn descriptor(self) -> EndpointDescriptor {
        match self {
            EndpointIdentity::Wired => EndpointDescriptor::usb(),
            EndpointIdentity::Wireless(index) => EndpointDescriptor::ble(index.get()),
        }
    }
}

impl fmt::Display for EndpointIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointIdentity::Wired => write!(f, "USB"),
            EndpointIdentity::Wireless(index) => write!(f, "BLE profile {}", index.get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_usb_descriptor_is_wired() {
        let id = EndpointIdentity::classify(EndpointDescriptor::usb());
        assert_eq!(id, EndpointIdentity::Wired);
    }

    #[test]
    fn test_classify_usb_ignores_profile_index() {
        // The profile index is not meaningful for USB and must not be checked.
        let descriptor = EndpointDescriptor {
            transport: Transport::Usb,
            ble_profile_index: 200,
        };
        assert_eq!(EndpointIdentity::classify(descriptor), EndpointIdentity::Wired);
    }

    #[test]
    fn test_classify_ble_descriptor_keeps_profile_index() {
        let id = EndpointIdentity::classify(EndpointDescriptor::ble(2));
        assert_eq!(id, EndpointIdentity::Wireless(ProfileIndex::new(2).unwrap()));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_classify_ble_descriptor_with_out_of_range_index_panics() {
        EndpointIdentity::classify(EndpointDescriptor::ble(BLE_PROFILE_COUNT as u8));
    }

    #[test]
    fn test_profile_index_rejects_values_at_or_above_bound() {
        assert!(ProfileIndex::new(0).is_some());
        assert!(ProfileIndex::new(BLE_PROFILE_COUNT as u8 - 1).is_some());
        assert!(ProfileIndex::new(BLE_PROFILE_COUNT as u8).is_none());
        assert!(ProfileIndex::new(u8::MAX).is_none());
    }

    #[test]
    fn test_all_endpoints_lists_wired_first_then_every_profile() {
        let all: Vec<_> = EndpointIdentity::all().collect();

        assert_eq!(all.len(), WIRED_COUNT + BLE_PROFILE_COUNT);
        assert_eq!(all[0], EndpointIdentity::Wired);
        for (i, id) in all[1..].iter().enumerate() {
            assert_eq!(*id, EndpointIdentity::Wireless(ProfileIndex::new(i as u8).unwrap()));
        }
    }

    #[test]
    fn test_descriptor_round_trips_through_classify() {
        for id in EndpointIdentity::all() {
            assert_eq!(EndpointIdentity::classify(id.descriptor()), id);
        }
    }

    #[test]
    fn test_display_names_the_channel() {
        assert_eq!(EndpointIdentity::Wired.to_string(), "USB");
        let ble = EndpointIdentity::Wireless(ProfileIndex::new(3).unwrap());
        assert_eq!(ble.to_string(), "BLE profile 3");
    }
}
