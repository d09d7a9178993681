//! Line-oriented event script for the host simulator.
//!
//! Each non-empty line is one command; `#` starts a comment:
//!
//! ```text
//! press 3          # "set default layer" binding pressed with parameter 3
//! release          # binding released
//! select usb       # switch the output endpoint to USB
//! select ble 2     # switch to BLE profile 2
//! status           # print the table and active layer as JSON
//! ```
//!
//! Controller and endpoint failures are logged and the script keeps going,
//! as the device would.  A malformed line stops the run.

use std::io::{BufRead, Write};
use std::sync::Arc;

use deflayer_core::{EndpointDescriptor, EndpointIdentity, LayerIndex, SettingsStore};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::apply_layer::Keymap;
use crate::application::controller::{ControllerError, DefaultLayerController, EndpointSelector};
use crate::application::events::{dispatch, DeviceEvent};
use crate::infrastructure::endpoints::{EndpointError, SimulatedEndpoints};
use crate::infrastructure::keymap::SimulatedKeymap;

/// Error type for script parsing and execution.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A line is not a valid command.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The endpoint subsystem rejected a selection.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// A controller entry point failed.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Reading the script or writing output failed.
    #[error("script I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A status report could not be serialized.
    #[error("could not encode status: {0}")]
    Json(#[from] serde_json::Error),
}

/// One script command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCommand {
    Press(u32),
    Release,
    Select(EndpointDescriptor),
    Status,
}

impl ScriptCommand {
    /// Parses one line.  Blank lines and comments yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for malformed lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.split('#').next().unwrap_or_default().trim();
        let words: Vec<&str> = line.split_whitespace().collect();

        let command = match words.as_slice() {
            [] => return Ok(None),
            ["press", param] => {
                let param = param
                    .parse::<u32>()
                    .map_err(|e| format!("invalid binding parameter `{param}`: {e}"))?;
                ScriptCommand::Press(param)
            }
            ["release"] => ScriptCommand::Release,
            ["select", "usb"] => ScriptCommand::Select(EndpointDescriptor::usb()),
            ["select", "ble", index] => {
                let index = index
                    .parse::<u8>()
                    .map_err(|e| format!("invalid BLE profile `{index}`: {e}"))?;
                ScriptCommand::Select(EndpointDescriptor::ble(index))
            }
            ["status"] => ScriptCommand::Status,
            _ => return Err(format!("unknown command `{line}`")),
        };
        Ok(Some(command))
    }
}

/// One `(endpoint, layer)` entry of a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointLayer {
    pub endpoint: String,
    pub layer: LayerIndex,
}

/// Snapshot printed by the `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub endpoint: String,
    pub active_layer: LayerIndex,
    pub layer_count: u8,
    pub default_layers: Vec<EndpointLayer>,
}

/// The controller wired to the simulated devices.
pub struct HostSession {
    controller: DefaultLayerController,
    keymap: Arc<SimulatedKeymap>,
    endpoints: Arc<SimulatedEndpoints>,
}

impl HostSession {
    /// Builds a controller over `store` and the given simulators.  Call
    /// [`boot`](Self::boot) before executing commands.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        keymap: Arc<SimulatedKeymap>,
        endpoints: Arc<SimulatedEndpoints>,
    ) -> Self {
        let controller = DefaultLayerController::new(
            store,
            Arc::clone(&keymap) as Arc<dyn Keymap>,
            Arc::clone(&endpoints) as Arc<dyn EndpointSelector>,
        );
        Self {
            controller,
            keymap,
            endpoints,
        }
    }

    /// Boots the controller and returns the activated layer.
    ///
    /// A failed boot is logged and yields `None`; the session keeps handling
    /// commands with whatever table and layer the controller ended up with.
    pub fn boot(&mut self) -> Option<LayerIndex> {
        match self.controller.boot() {
            Ok(layer) => {
                info!("booted on layer {layer}");
                Some(layer)
            }
            Err(e) => {
                error!("boot failed (code {}): {e}", e.code());
                None
            }
        }
    }

    /// Returns the controller.
    pub fn controller(&self) -> &DefaultLayerController {
        &self.controller
    }

    /// Builds a [`StatusReport`] from the current state.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            endpoint: self.controller.current_endpoint().to_string(),
            active_layer: self.keymap.active_layer(),
            layer_count: self.keymap.layer_count(),
            default_layers: self
                .controller
                .table()
                .entries()
                .map(|(endpoint, layer)| EndpointLayer {
                    endpoint: endpoint.to_string(),
                    layer,
                })
                .collect(),
        }
    }

    /// Executes one command.  Returns a report for `status`.
    ///
    /// `select` of the already selected endpoint raises no event.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Controller`] for a failed binding press and
    /// [`ScriptError::Endpoint`] for an unknown BLE profile.
    pub fn execute(&mut self, command: ScriptCommand) -> Result<Option<StatusReport>, ScriptError> {
        match command {
            ScriptCommand::Press(param) => {
                dispatch(&mut self.controller, DeviceEvent::BindingPressed { param })?;
                dispatch(&mut self.controller, DeviceEvent::BindingReleased)?;
            }
            ScriptCommand::Release => {
                dispatch(&mut self.controller, DeviceEvent::BindingReleased)?;
            }
            ScriptCommand::Select(descriptor) => {
                if self.endpoints.select(descriptor)? {
                    dispatch(&mut self.controller, DeviceEvent::EndpointChanged(descriptor))?;
                } else {
                    debug!("{} already selected", EndpointIdentity::classify(descriptor));
                }
            }
            ScriptCommand::Status => return Ok(Some(self.status())),
        }
        Ok(None)
    }

    /// Runs every line of `input`, writing one JSON line to `output` per
    /// `status` command.
    ///
    /// Returns the number of commands executed.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed line ([`ScriptError::Parse`]) or I/O
    /// failure.  Controller and endpoint errors are logged and skipped.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<usize, ScriptError> {
        let mut executed = 0;
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let number = index + 1;
            let command = match ScriptCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    return Err(ScriptError::Parse {
                        line: number,
                        message,
                    })
                }
            };

            executed += 1;
            match self.execute(command) {
                Ok(Some(report)) => {
                    serde_json::to_writer(&mut output, &report)?;
                    writeln!(output)?;
                }
                Ok(None) => {}
                Err(e @ (ScriptError::Controller(_) | ScriptError::Endpoint(_))) => {
                    warn!("line {number}: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        output.flush()?;
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use deflayer_core::StoreError;

    use super::*;
    use crate::infrastructure::storage::memory_store::MemorySettingsStore;

    fn session(initial: EndpointDescriptor) -> (HostSession, Arc<MemorySettingsStore>) {
        let store = Arc::new(MemorySettingsStore::new());
        let session = HostSession::new(
            Arc::clone(&store) as Arc<dyn SettingsStore>,
            Arc::new(SimulatedKeymap::new(8)),
            Arc::new(SimulatedEndpoints::new(initial).unwrap()),
        );
        (session, store)
    }

    // ── parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_recognises_every_command() {
        assert_eq!(ScriptCommand::parse("press 3"), Ok(Some(ScriptCommand::Press(3))));
        assert_eq!(ScriptCommand::parse("release"), Ok(Some(ScriptCommand::Release)));
        assert_eq!(
            ScriptCommand::parse("  select usb "),
            Ok(Some(ScriptCommand::Select(EndpointDescriptor::usb())))
        );
        assert_eq!(
            ScriptCommand::parse("select ble 4"),
            Ok(Some(ScriptCommand::Select(EndpointDescriptor::ble(4))))
        );
        assert_eq!(ScriptCommand::parse("status"), Ok(Some(ScriptCommand::Status)));
    }

    #[test]
    fn test_parse_skips_blank_lines_and_comments() {
        assert_eq!(ScriptCommand::parse(""), Ok(None));
        assert_eq!(ScriptCommand::parse("   "), Ok(None));
        assert_eq!(ScriptCommand::parse("# only a comment"), Ok(None));
        assert_eq!(
            ScriptCommand::parse("press 1 # trailing"),
            Ok(Some(ScriptCommand::Press(1)))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        for line in ["press", "press x", "press -1", "select", "select ble", "jump 3"] {
            assert!(ScriptCommand::parse(line).is_err(), "{line:?} must be rejected");
        }
    }

    // ── execution ─────────────────────────────────────────────────────────────

    #[test]
    fn test_run_prints_status_as_json() {
        // Arrange
        let (mut session, _store) = session(EndpointDescriptor::usb());
        session.boot().unwrap();
        let script = "press 2\nstatus\n";
        let mut out = Vec::new();

        // Act
        let executed = session.run(script.as_bytes(), &mut out).unwrap();

        // Assert
        assert_eq!(executed, 2);
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["endpoint"], "USB");
        assert_eq!(report["active_layer"], 2);
        assert_eq!(report["layer_count"], 8);
        assert_eq!(report["default_layers"][0]["layer"], 2);
    }

    #[test]
    fn test_run_stops_at_malformed_line() {
        let (mut session, store) = session(EndpointDescriptor::usb());
        session.boot().unwrap();

        let result = session.run("press 1\nbogus\npress 2\n".as_bytes(), std::io::sink());

        assert!(matches!(result, Err(ScriptError::Parse { line: 2, .. })));
        assert_eq!(store.get("default_layer/settings"), Some(vec![1, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_run_continues_after_controller_error() {
        let (mut session, store) = session(EndpointDescriptor::usb());
        session.boot().unwrap();

        let executed = session
            .run("press 99\nselect ble 9\npress 4\n".as_bytes(), std::io::sink())
            .unwrap();

        assert_eq!(executed, 3);
        assert_eq!(store.get("default_layer/settings"), Some(vec![4, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_execute_press_reports_save_failure() {
        let (mut session, store) = session(EndpointDescriptor::usb());
        session.boot().unwrap();
        store.set_fail_writes(true);

        let result = session.execute(ScriptCommand::Press(1));

        assert!(matches!(
            result,
            Err(ScriptError::Controller(ControllerError::Save(StoreError::Write { .. })))
        ));
    }

    #[test]
    fn test_failed_boot_still_handles_commands() {
        // Arrange: the namespace is already taken, so registration fails
        let store = Arc::new(MemorySettingsStore::new());
        store.register("default_layer").unwrap();
        let keymap = Arc::new(SimulatedKeymap::new(8));
        let mut session = HostSession::new(
            Arc::clone(&store) as Arc<dyn SettingsStore>,
            Arc::clone(&keymap),
            Arc::new(SimulatedEndpoints::new(EndpointDescriptor::usb()).unwrap()),
        );

        // Act
        let booted = session.boot();
        let executed = session.run("press 3\n".as_bytes(), std::io::sink()).unwrap();

        // Assert
        assert_eq!(booted, None);
        assert!(session.controller().is_booted());
        assert_eq!(executed, 1);
        assert_eq!(session.controller().table().get(EndpointIdentity::Wired), 3);
        assert_eq!(keymap.active_layer(), 3);
    }

    #[test]
    fn test_select_of_current_endpoint_does_not_reapply() {
        // Arrange
        let keymap = Arc::new(SimulatedKeymap::new(8));
        let mut session = HostSession::new(
            Arc::new(MemorySettingsStore::new()),
            Arc::clone(&keymap),
            Arc::new(SimulatedEndpoints::new(EndpointDescriptor::usb()).unwrap()),
        );
        session.boot().unwrap();
        let activations = keymap.activation_count();

        // Act
        session
            .execute(ScriptCommand::Select(EndpointDescriptor::usb()))
            .unwrap();

        // Assert
        assert_eq!(keymap.activation_count(), activations);
    }
}
