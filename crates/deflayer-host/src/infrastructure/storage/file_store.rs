//! File-backed settings store.
//!
//! Each settings key maps to one file below a root directory.  Key segments
//! become directories and the last segment becomes a file with a `.bin`
//! suffix:
//!
//! ```text
//! default_layer/settings   →   <root>/default_layer/settings.bin
//! ```
//!
//! The suffix keeps a value and a deeper key with the same prefix from
//! colliding (`a/b` is `a/b.bin`, `a/b/c` is `a/b/c.bin`).
//!
//! Writes go to a temporary sibling file which is then renamed over the
//! target, so a crash mid-write leaves either the old or the new value on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use deflayer_core::settings::{validate_key, KEY_SEPARATOR};
use deflayer_core::{SettingsStore, StoreError};
use tracing::debug;

use crate::infrastructure::lock;

/// File name suffix of stored values.
const VALUE_EXTENSION: &str = "bin";

/// Suffix of the temporary file used during a write.
const TEMP_EXTENSION: &str = "bin.tmp";

/// A [`SettingsStore`] persisting each key as a file under `root`.
pub struct FileSettingsStore {
    root: PathBuf,
    namespaces: Mutex<Vec<String>>,
}

impl FileSettingsStore {
    /// Creates a store rooted at `root`.  Nothing is touched on disk until
    /// [`SettingsStore::init`] or the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            namespaces: Mutex::new(Vec::new()),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a validated key to its value file.
    fn value_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(key.split(KEY_SEPARATOR));
        path.set_extension(VALUE_EXTENSION);
        path
    }

    fn is_registered(&self, namespace: &str) -> bool {
        lock(&self.namespaces).iter().any(|n| n == namespace)
    }
}

impl SettingsStore for FileSettingsStore {
    fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::Write {
            key: self.root.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn register(&self, namespace: &str) -> Result<(), StoreError> {
        validate_key(namespace)?;
        let mut namespaces = lock(&self.namespaces);
        if namespaces.iter().any(|n| n == namespace) {
            return Err(StoreError::AlreadyRegistered(namespace.to_string()));
        }
        namespaces.push(namespace.to_string());
        Ok(())
    }

    fn load_subtree(
        &self,
        namespace: &str,
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<(), StoreError> {
        if !self.is_registered(namespace) {
            return Err(StoreError::NotRegistered(namespace.to_string()));
        }

        let dir = self.root.join(namespace);
        let mut files = Vec::new();
        match collect_values(&dir, "", &mut files) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StoreError::Read {
                    key: namespace.to_string(),
                    reason: e.to_string(),
                })
            }
        }
        // Directory order puts `a/` before `a.bin`; callers expect key order.
        files.sort_by(|a, b| a.0.cmp(&b.0));

        for (relative, path) in files {
            let value = fs::read(&path).map_err(|e| StoreError::Read {
                key: format!("{namespace}{KEY_SEPARATOR}{relative}"),
                reason: e.to_string(),
            })?;
            debug!("loaded {} bytes from {}", value.len(), path.display());
            visit(&relative, &value);
        }
        Ok(())
    }

    fn save_one(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let path = self.value_path(key);
        let write_err = |e: io::Error| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let temp = path.with_extension(TEMP_EXTENSION);
        fs::write(&temp, value).map_err(write_err)?;
        fs::rename(&temp, &path).map_err(write_err)?;

        debug!("saved {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Recursively gathers `(relative_key, path)` for every value file under `dir`.
/// The result is in directory-walk order, not key order.
fn collect_values(dir: &Path, prefix: &str, out: &mut Vec<(String, PathBuf)>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if entry.file_type()?.is_dir() {
            let nested = format!("{prefix}{name}{KEY_SEPARATOR}");
            collect_values(&path, &nested, out)?;
        } else if let Some(stem) = name.strip_suffix(&format!(".{VALUE_EXTENSION}")) {
            out.push((format!("{prefix}{stem}"), path.clone()));
        }
    }
    Ok(())
}
