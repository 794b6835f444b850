//! File-backed image store.
//!
//! Each image is a `<key>.uri` file holding the data URI verbatim. Writes go
//! through a `.tmp` file and `rename()` so a crash never leaves a key that
//! resolves to a half-written payload.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{ImageStore, StoreError, is_valid_key, new_key};

const PAYLOAD_EXTENSION: &str = "uri";

pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    /// Opens (creating if needed) an image directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("Image store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{PAYLOAD_EXTENSION}"))
    }
}

impl ImageStore for DiskImageStore {
    fn store_image(&self, data_uri: &str) -> Result<String, StoreError> {
        let key = new_key();
        let path = self.path_for(&key);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data_uri)?;
        fs::rename(&tmp_path, &path)?;
        debug!("Stored image {} ({} bytes)", key, data_uri.len());
        Ok(key)
    }

    fn retrieve_image(&self, key: &str) -> Result<Option<String>, StoreError> {
        if !is_valid_key(key) {
            return Ok(None);
        }
        match fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut removed = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let ours = path
                .extension()
                .is_some_and(|ext| ext == PAYLOAD_EXTENSION || ext == "tmp");
            if !ours {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove {}: {}", path.display(), e);
                return Err(StoreError::Io(e));
            }
            removed += 1;
        }
        info!("Cleared image store ({} files)", removed);
        Ok(())
    }
}
