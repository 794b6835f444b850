//! # Image Store
//!
//! Key/value storage for generated images. Payloads are data URIs
//! (`data:image/png;base64,...`); keys are opaque strings handed out by the
//! store. Messages only ever reference keys, never payloads.
//!
//! - [`MemoryImageStore`]: process-local, gone on exit
//! - [`DiskImageStore`]: one file per key under the data directory

use std::fmt;
use std::io;

pub mod disk;
pub mod memory;

pub use disk::DiskImageStore;
pub use memory::MemoryImageStore;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    /// A thread panicked while holding the store lock.
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "image store I/O error: {e}"),
            StoreError::Poisoned => write!(f, "image store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

pub trait ImageStore: Send + Sync {
    /// Stores a payload and returns the key it can be retrieved under.
    fn store_image(&self, data_uri: &str) -> Result<String, StoreError>;

    /// Returns the payload for `key`, or `None` if nothing is stored there.
    fn retrieve_image(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Drops every stored image.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Generates a fresh store key.
pub(crate) fn new_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Keys are always UUIDs; anything else (including error tokens) can't be stored.
pub(crate) fn is_valid_key(key: &str) -> bool {
    uuid::Uuid::parse_str(key).is_ok()
}
