//! Application layer use cases for the host.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `deflayer_core`) and the infrastructure (files, simulated
//! devices, the command line).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "remember
//!   layer 3 for the current BLE profile and switch to it").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the keymap, endpoint subsystem and settings store can be swapped
//!   without changing this code.
//! - **Contain no file system access and no device I/O**.
//!
//! # Sub-modules
//!
//! - **`apply_layer`** – Activates the default layer remembered for an
//!   endpoint through the [`apply_layer::Keymap`] trait.
//!
//! - **`controller`** – Owns the default-layer table and reacts to boot,
//!   binding presses and releases, and endpoint changes.
//!
//! - **`events`** – Routes a [`events::DeviceEvent`] to the controller.

pub mod apply_layer;
pub mod controller;
pub mod events;
