//! deflayer host simulator: entry point.
//!
//! Runs the per-endpoint default-layer controller against a simulated keymap
//! and endpoint subsystem, persisting the table in a settings directory (or in
//! memory with `--ephemeral`).  Events come from a line script read from
//! `--script` or stdin; see [`deflayer_host::infrastructure::script`].
//!
//! # Usage
//!
//! ```text
//! deflayer-host [OPTIONS]
//!
//! Options:
//!   --config       <FILE>    TOML config file [default: platform config dir]
//!   --settings-dir <DIR>     Settings directory (overrides the config file)
//!   --layers       <N>       Number of keymap layers (overrides the config file)
//!   --endpoint     <EP>      Initial endpoint, `usb` or `ble:<n>`
//!   --ephemeral              Keep settings in memory only
//!   --script       <FILE>    Event script [default: stdin]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Flag             |
//! |-------------------------|------------------|
//! | `DEFLAYER_CONFIG`       | `--config`       |
//! | `DEFLAYER_SETTINGS_DIR` | `--settings-dir` |
//! | `DEFLAYER_LAYERS`       | `--layers`       |
//! | `DEFLAYER_ENDPOINT`     | `--endpoint`     |
//!
//! `status` reports are written to stdout, one JSON object per line; logs go
//! to stderr.  `RUST_LOG` overrides the configured log level.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deflayer_core::SettingsStore;
use deflayer_host::infrastructure::endpoints::SimulatedEndpoints;
use deflayer_host::infrastructure::keymap::SimulatedKeymap;
use deflayer_host::infrastructure::script::HostSession;
use deflayer_host::infrastructure::storage::config::{self, HostConfig};
use deflayer_host::infrastructure::storage::file_store::FileSettingsStore;
use deflayer_host::infrastructure::storage::memory_store::MemorySettingsStore;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Per-endpoint default layer simulator.
///
/// Flags override the values read from the config file.
#[derive(Debug, Parser)]
#[command(
    name = "deflayer-host",
    about = "Per-endpoint default keymap layer simulator",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long, env = "DEFLAYER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding persisted settings.
    #[arg(long, env = "DEFLAYER_SETTINGS_DIR")]
    settings_dir: Option<PathBuf>,

    /// Number of layers in the simulated keymap.
    #[arg(long, env = "DEFLAYER_LAYERS")]
    layers: Option<u8>,

    /// Endpoint selected at start-up: `usb` or `ble:<profile>`.
    #[arg(long, env = "DEFLAYER_ENDPOINT")]
    endpoint: Option<String>,

    /// Keep settings in memory; nothing is read from or written to disk.
    #[arg(long)]
    ephemeral: bool,

    /// Event script to run instead of reading stdin.
    #[arg(long)]
    script: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<HostConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config::config_file_path().context("cannot locate the config file")?,
        };
        let mut cfg = config::load_config(&path)
            .with_context(|| format!("cannot load config from {}", path.display()))?;

        if let Some(dir) = &self.settings_dir {
            cfg.settings.dir = Some(dir.clone());
        }
        if let Some(layers) = self.layers {
            cfg.keymap.layer_count = layers;
        }
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint.initial = endpoint.clone();
        }
        Ok(cfg)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .with_writer(io::stderr)
        .init();

    let initial = config::parse_endpoint(&cfg.endpoint.initial)?;
    let store: Arc<dyn SettingsStore> = if cli.ephemeral {
        info!("using in-memory settings");
        Arc::new(MemorySettingsStore::new())
    } else {
        let dir = config::settings_dir(&cfg).context("cannot locate the settings directory")?;
        info!("using settings directory {}", dir.display());
        Arc::new(FileSettingsStore::new(dir))
    };

    let keymap = Arc::new(SimulatedKeymap::new(cfg.keymap.layer_count));
    let endpoints = Arc::new(SimulatedEndpoints::new(initial)?);
    let mut session = HostSession::new(store, keymap, endpoints);

    // A failed boot is logged by the session; the device keeps handling events.
    session.boot();

    let executed = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            session.run(BufReader::new(file), io::stdout().lock())?
        }
        None => session.run(io::stdin().lock(), io::stdout().lock())?,
    };

    info!("executed {executed} commands");
    Ok(())
}
