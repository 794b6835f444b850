use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use super::{ImageStore, StoreError, new_key};

/// In-memory image store. Used for `--ephemeral` runs and tests.
#[derive(Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, String>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.lock().map(|images| images.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageStore for MemoryImageStore {
    fn store_image(&self, data_uri: &str) -> Result<String, StoreError> {
        let key = new_key();
        let mut images = self.images.lock().map_err(|_| StoreError::Poisoned)?;
        images.insert(key.clone(), data_uri.to_string());
        debug!("Stored image {} ({} bytes) in memory", key, data_uri.len());
        Ok(key)
    }

    fn retrieve_image(&self, key: &str) -> Result<Option<String>, StoreError> {
        let images = self.images.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(images.get(key).cloned())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut images = self.images.lock().map_err(|_| StoreError::Poisoned)?;
        images.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_then_retrieve_is_identical() {
        let store = MemoryImageStore::new();
        let payload = "data:image/png;base64,iVBORw0KGgo=";
        let key = store.store_image(payload).unwrap();
        assert_eq!(store.retrieve_image(&key).unwrap().as_deref(), Some(payload));
    }

    #[test]
    fn test_keys_are_unique() {
        let store = MemoryImageStore::new();
        let a = store.store_image("data:a").unwrap();
        let b = store.store_image("data:a").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let store = MemoryImageStore::new();
        assert!(store.retrieve_image("missing").unwrap().is_none());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let store = MemoryImageStore::new();
        let key = store.store_image("data:x").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(store.retrieve_image(&key).unwrap().is_none());
    }
}
