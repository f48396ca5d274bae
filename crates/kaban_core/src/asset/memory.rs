use super::{normalize_extension, AssetKey, AssetResult, AssetStore, StoredAsset};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct Entry {
    extension: String,
    bytes: Vec<u8>,
}

/// In-memory asset store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: Mutex<HashMap<AssetKey, Entry>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AssetKey, Entry>> {
        self.assets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn located(key: &AssetKey, extension: &str) -> StoredAsset {
    StoredAsset {
        relative_path: key.relative_path(extension),
        extension: extension.to_string(),
    }
}

impl AssetStore for MemoryAssetStore {
    fn store(&self, key: &AssetKey, extension: &str, bytes: &[u8]) -> AssetResult<StoredAsset> {
        let extension = normalize_extension(extension)?;
        self.lock().insert(
            *key,
            Entry {
                extension: extension.clone(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(located(key, &extension))
    }

    fn resolve(&self, key: &AssetKey) -> AssetResult<Option<StoredAsset>> {
        Ok(self
            .lock()
            .get(key)
            .map(|entry| located(key, &entry.extension)))
    }

    fn read(&self, key: &AssetKey) -> AssetResult<Option<Vec<u8>>> {
        Ok(self.lock().get(key).map(|entry| entry.bytes.clone()))
    }

    fn duplicate(&self, source: &AssetKey, target: &AssetKey) -> AssetResult<bool> {
        let mut assets = self.lock();
        let Some(entry) = assets.get(source).cloned() else {
            return Ok(false);
        };
        assets.insert(*target, entry);
        Ok(true)
    }

    fn remove(&self, key: &AssetKey) -> AssetResult<bool> {
        Ok(self.lock().remove(key).is_some())
    }
}
