//! # State Persistence
//!
//! Namespaced JSON records under the data directory, one file per namespace
//! (`<namespace>.json`). Chat and config state each own a namespace and write
//! through on every mutation.
//!
//! Records are wrapped in a versioned envelope:
//!
//! ```text
//! { "state": { ... }, "version": 0 }
//! ```
//!
//! All writes use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Bumped whenever a persisted record changes shape incompatibly.
pub const STATE_VERSION: u32 = 0;

#[derive(Debug)]
pub enum PersistError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "persistence I/O error: {e}"),
            PersistError::Json(e) => write!(f, "persistence format error: {e}"),
        }
    }
}

impl std::error::Error for PersistError {}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    state: &'a T,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Handle to the on-disk state directory. `None` means nothing touches disk.
#[derive(Clone, Debug, Default)]
pub struct Persistence {
    dir: Option<PathBuf>,
}

impl Persistence {
    /// Opens (creating if needed) a state directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir: Some(dir) })
    }

    /// A persistence handle that never reads or writes.
    pub fn ephemeral() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn record_path(dir: &Path, namespace: &str) -> PathBuf {
        dir.join(format!("{namespace}.json"))
    }

    /// Loads the record stored under `namespace`.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet, or when the record
    /// was written by an incompatible version (it is ignored, not deleted).
    pub fn load<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>, PersistError> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let path = Self::record_path(dir, namespace);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistError::Io(e)),
        };
        let envelope: Envelope<T> = serde_json::from_str(&json).map_err(PersistError::Json)?;
        if envelope.version != STATE_VERSION {
            warn!(
                "Ignoring {} record with unknown version {}",
                namespace, envelope.version
            );
            return Ok(None);
        }
        debug!("Loaded {} from {}", namespace, path.display());
        Ok(Some(envelope.state))
    }

    /// Atomically replaces the record stored under `namespace`.
    pub fn save<T: Serialize>(&self, namespace: &str, state: &T) -> Result<(), PersistError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = Self::record_path(dir, namespace);
        let envelope = EnvelopeRef {
            state,
            version: STATE_VERSION,
        };
        atomic_write_json(&path, &envelope)?;
        debug!("Saved {} to {}", namespace, path.display());
        Ok(())
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), PersistError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data).map_err(PersistError::Json)?;
    fs::write(&tmp_path, json).map_err(PersistError::Io)?;
    fs::rename(&tmp_path, path).map_err(PersistError::Io)?;
    Ok(())
}
