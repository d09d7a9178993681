//! TOML-based configuration for the host binary.
//!
//! Read from `--config` or, by default, the platform-appropriate location:
//! - Windows:  `%APPDATA%\deflayer\config.toml`
//! - Linux:    `~/.config/deflayer/config.toml`
//! - macOS:    `~/Library/Application Support/deflayer/config.toml`
//!
//! Example:
//!
//! ```toml
//! [settings]
//! dir = "/var/lib/deflayer"
//!
//! [keymap]
//! layer_count = 8
//!
//! [endpoint]
//! initial = "ble:0"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! # Serde default values
//!
//! Every section and field has a default, so an absent file, an empty file,
//! and a file written for an older version all load without errors.

use std::path::{Path, PathBuf};

use deflayer_core::{EndpointDescriptor, BLE_PROFILE_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An endpoint string is not `usb` or `ble:<profile>`.
    #[error("invalid endpoint `{0}`: expected `usb` or `ble:<0..{BLE_PROFILE_COUNT}>`")]
    InvalidEndpoint(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub keymap: KeymapConfig,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where persisted settings live.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsConfig {
    /// Settings root directory.  Defaults to `settings/` in the platform config
    /// directory, wherever `--config` points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Shape of the simulated keymap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeymapConfig {
    /// Number of layers; valid layer indices are `0..layer_count`.
    #[serde(default = "default_layer_count")]
    pub layer_count: u8,
}

/// Endpoint selected at power-on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// `"usb"` or `"ble:<profile>"`.
    #[serde(default = "default_initial_endpoint")]
    pub initial: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_layer_count() -> u8 {
    8
}
fn default_initial_endpoint() -> String {
    "usb".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            layer_count: default_layer_count(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            initial: default_initial_endpoint(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Parses `"usb"` or `"ble:<profile>"` (case-insensitive).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEndpoint`] for anything else, including BLE
/// profiles at or above [`BLE_PROFILE_COUNT`].
pub fn parse_endpoint(text: &str) -> Result<EndpointDescriptor, ConfigError> {
    let invalid = || ConfigError::InvalidEndpoint(text.to_string());
    let normalized = text.trim().to_ascii_lowercase();

    if normalized == "usb" {
        return Ok(EndpointDescriptor::usb());
    }
    let index = normalized
        .strip_prefix("ble:")
        .and_then(|n| n.trim().parse::<u8>().ok())
        .ok_or_else(invalid)?;
    if usize::from(index) >= BLE_PROFILE_COUNT {
        return Err(invalid());
    }
    Ok(EndpointDescriptor::ble(index))
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Resolves the settings directory: the configured one, or `settings/` in the
/// platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if no directory is configured
/// and the platform directory cannot be determined.
pub fn settings_dir(config: &HostConfig) -> Result<PathBuf, ConfigError> {
    match &config.settings.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(config_dir()?.join("settings")),
    }
}

/// Loads [`HostConfig`] from `path`, returning `HostConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("deflayer"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("deflayer"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("deflayer")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use deflayer_core::Transport;

    #[test]
    fn test_host_config_defaults() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.keymap.layer_count, 8);
        assert_eq!(cfg.endpoint.initial, "usb");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.settings.dir.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: HostConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_given_fields() {
        // Arrange
        let toml_str = r#"
[keymap]
layer_count = 4

[settings]
dir = "/tmp/deflayer-settings"
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.keymap.layer_count, 4);
        assert_eq!(cfg.settings.dir, Some(PathBuf::from("/tmp/deflayer-settings")));
        assert_eq!(cfg.endpoint.initial, "usb");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = HostConfig::default();
        cfg.endpoint.initial = "ble:2".into();
        cfg.logging.level = "debug".into();

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: HostConfig = toml::from_str(&text).expect("deserialize");

        assert_eq!(cfg, restored);
        assert!(!text.contains("dir"), "unset settings dir must be omitted");
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<HostConfig, toml::de::Error> = toml::from_str("[[[ not toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config(&path).expect("missing file is not an error");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = std::env::temp_dir().join(format!("deflayer_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[keymap]\nlayer_count = 3\n").unwrap();

        let cfg = load_config(&path).unwrap();

        assert_eq!(cfg.keymap.layer_count, 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_settings_dir_prefers_configured_directory() {
        let mut cfg = HostConfig::default();
        cfg.settings.dir = Some(PathBuf::from("/srv/deflayer"));
        assert_eq!(settings_dir(&cfg).unwrap(), PathBuf::from("/srv/deflayer"));
    }

    #[test]
    fn test_settings_dir_defaults_to_platform_config_dir() {
        let cfg = HostConfig::default();
        if let Ok(base) = config_dir() {
            assert_eq!(settings_dir(&cfg).unwrap(), base.join("settings"));
        }
    }

    #[test]
    fn test_parse_endpoint_accepts_usb_and_ble_profiles() {
        assert_eq!(parse_endpoint("usb").unwrap(), EndpointDescriptor::usb());
        assert_eq!(parse_endpoint(" USB ").unwrap(), EndpointDescriptor::usb());
        let ble = parse_endpoint("ble:3").unwrap();
        assert_eq!(ble.transport, Transport::Ble);
        assert_eq!(ble.ble_profile_index, 3);
    }

    #[test]
    fn test_parse_endpoint_rejects_garbage_and_out_of_range_profiles() {
        let out_of_range = format!("ble:{BLE_PROFILE_COUNT}");
        for text in ["", "bt", "ble", "ble:", "ble:x", "ble:-1", out_of_range.as_str()] {
            assert!(
                matches!(parse_endpoint(text), Err(ConfigError::InvalidEndpoint(_))),
                "{text:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
    }
}
