//! Domain entities for per-endpoint default layers.
//!
//! This module contains pure state with no infrastructure dependencies: it
//! never touches a settings store, a keymap, or the transport layer.  Those
//! collaborators live behind traits in the outer layers and call into the
//! domain, never the other way round.

/// Endpoint identity: the wired channel or one BLE profile.
///
/// See [`endpoint::EndpointIdentity`] for the main type.
pub mod endpoint;

/// The remembered default layer per endpoint and its persisted blob form.
pub mod table;
