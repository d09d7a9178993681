//! # deflayer-core
//!
//! Shared library for remembering a default keymap layer per output endpoint.
//!
//! A keyboard can send its keystrokes over USB or over one of several BLE
//! profiles.  Each of those *endpoints* may want a different base layer (a
//! different OS on the other end, a different language, ...).  This crate
//! holds the state that makes that possible and the contract for persisting it:
//!
//! - **`domain`** – the closed [`EndpointIdentity`] type and the
//!   [`DefaultLayerTable`] mapping every endpoint to a layer, including its
//!   fixed-size blob encoding.
//!
//! - **`settings`** – the [`SettingsStore`] trait describing the durable
//!   key-value store, and [`DefaultLayerSettings`], the adapter that loads and
//!   saves the table through it.
//!
//! Reacting to key presses and endpoint changes is the job of the
//! `deflayer-host` crate, which builds on these types.

pub mod domain;
pub mod settings;

pub use domain::endpoint::{
    EndpointDescriptor, EndpointIdentity, ProfileIndex, Transport, BLE_PROFILE_COUNT, WIRED_COUNT,
};
pub use domain::table::{DefaultLayerTable, LayerIndex, TableError, BLOB_LEN};
pub use settings::{DefaultLayerSettings, SettingsStore, StoreError};
