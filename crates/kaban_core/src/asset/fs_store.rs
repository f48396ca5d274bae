//! Filesystem-backed asset store.
//!
//! # Invariants
//! - The in-memory index mirrors the files on disk: one entry per key,
//!   holding the extension of the single file for that key.
//! - The index is rebuilt at open time from exact file-stem parsing; files
//!   whose names do not parse are ignored.
//! - Every operation holds the index lock for its whole duration.

use super::{
    normalize_extension, parse_exact_uuid, AssetError, AssetKey, AssetKind, AssetResult,
    AssetScope, AssetStore, StoredAsset, BOARD_WALLPAPERS_DIR, CARD_COVERS_DIR,
};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

type AssetIndex = HashMap<AssetKey, String>;

/// Asset store rooted at one directory.
#[derive(Debug)]
pub struct FsAssetStore {
    root: PathBuf,
    index: Mutex<AssetIndex>,
}

impl FsAssetStore {
    /// Opens (creating if needed) a store rooted at `root` and indexes it.
    pub fn open(root: impl AsRef<Path>) -> AssetResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|err| AssetError::io(&root, err))?;
        let index = scan(&root)?;
        debug!(
            "event=asset_index module=asset status=ok entries={}",
            index.len()
        );
        Ok(Self {
            root,
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored asset.
    pub fn absolute_path(&self, asset: &StoredAsset) -> PathBuf {
        self.root.join(&asset.relative_path)
    }

    fn lock(&self) -> MutexGuard<'_, AssetIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_file(&self, key: &AssetKey, extension: &str, bytes: &[u8]) -> AssetResult<()> {
        let dir = self.root.join(key.relative_dir());
        fs::create_dir_all(&dir).map_err(|err| AssetError::io(&dir, err))?;
        let path = self.root.join(key.relative_path(extension));
        fs::write(&path, bytes).map_err(|err| AssetError::io(&path, err))
    }

    fn remove_file(&self, key: &AssetKey, extension: &str) -> AssetResult<()> {
        let path = self.root.join(key.relative_path(extension));
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AssetError::io(&path, err)),
        }
    }

    fn replace(
        &self,
        index: &mut AssetIndex,
        key: &AssetKey,
        extension: &str,
        bytes: &[u8],
    ) -> AssetResult<StoredAsset> {
        self.write_file(key, extension, bytes)?;
        let previous = index.insert(*key, extension.to_string());
        if let Some(previous) = previous.filter(|previous| previous != extension) {
            // Index already points at the new file.
            if let Err(err) = self.remove_file(key, &previous) {
                warn!(
                    "event=asset_store module=asset status=degraded kind={} stale_extension={} error={}",
                    key.kind.as_str(),
                    previous,
                    err
                );
            }
        }
        Ok(StoredAsset {
            relative_path: key.relative_path(extension),
            extension: extension.to_string(),
        })
    }
}

impl AssetStore for FsAssetStore {
    fn store(&self, key: &AssetKey, extension: &str, bytes: &[u8]) -> AssetResult<StoredAsset> {
        let extension = normalize_extension(extension)?;
        let mut index = self.lock();
        let stored = self.replace(&mut index, key, &extension, bytes)?;
        debug!(
            "event=asset_store module=asset status=ok kind={} bytes={}",
            key.kind.as_str(),
            bytes.len()
        );
        Ok(stored)
    }

    fn resolve(&self, key: &AssetKey) -> AssetResult<Option<StoredAsset>> {
        Ok(self.lock().get(key).map(|extension| StoredAsset {
            relative_path: key.relative_path(extension),
            extension: extension.clone(),
        }))
    }

    fn read(&self, key: &AssetKey) -> AssetResult<Option<Vec<u8>>> {
        let index = self.lock();
        let Some(extension) = index.get(key) else {
            return Ok(None);
        };
        let path = self.root.join(key.relative_path(extension));
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AssetError::io(&path, err)),
        }
    }

    fn duplicate(&self, source: &AssetKey, target: &AssetKey) -> AssetResult<bool> {
        let mut index = self.lock();
        let Some(extension) = index.get(source).cloned() else {
            return Ok(false);
        };
        let source_path = self.root.join(source.relative_path(&extension));
        let bytes = match fs::read(&source_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                index.remove(source);
                return Ok(false);
            }
            Err(err) => return Err(AssetError::io(&source_path, err)),
        };
        self.replace(&mut index, target, &extension, &bytes)?;
        Ok(true)
    }

    fn remove(&self, key: &AssetKey) -> AssetResult<bool> {
        let mut index = self.lock();
        let Some(extension) = index.remove(key) else {
            return Ok(false);
        };
        self.remove_file(key, &extension)?;
        Ok(true)
    }
}

fn scan(root: &Path) -> AssetResult<AssetIndex> {
    let mut index = AssetIndex::new();

    let wallpapers = root.join(BOARD_WALLPAPERS_DIR);
    for (stem, extension) in files_in(&wallpapers)? {
        let key = AssetKey::parse_stem(AssetKind::BoardWallpaper, AssetScope::Global, &stem)
            .or_else(|| {
                AssetKey::parse_stem(AssetKind::BoardWallpaperPreview, AssetScope::Global, &stem)
            });
        if let Some(key) = key {
            insert_scanned(&mut index, key, extension);
        }
    }

    let covers = root.join(CARD_COVERS_DIR);
    for board_dir in subdirectories(&covers)? {
        let Some(board_id) = board_dir
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("board-"))
            .and_then(parse_exact_uuid)
        else {
            continue;
        };
        for (stem, extension) in files_in(&board_dir)? {
            if let Some(key) =
                AssetKey::parse_stem(AssetKind::CardCover, AssetScope::Board(board_id), &stem)
            {
                insert_scanned(&mut index, key, extension);
            }
        }
    }

    Ok(index)
}

fn insert_scanned(index: &mut AssetIndex, key: AssetKey, extension: String) {
    if index.contains_key(&key) {
        warn!(
            "event=asset_index module=asset status=duplicate kind={} extension={}",
            key.kind.as_str(),
            extension
        );
        return;
    }
    index.insert(key, extension);
}

fn read_dir_entries(dir: &Path) -> AssetResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(AssetError::io(dir, err)),
    };
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| AssetError::io(dir, err))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn subdirectories(dir: &Path) -> AssetResult<Vec<PathBuf>> {
    Ok(read_dir_entries(dir)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect())
}

fn files_in(dir: &Path) -> AssetResult<Vec<(String, String)>> {
    Ok(read_dir_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            let extension = normalize_extension(path.extension()?.to_str()?).ok()?;
            Some((stem, extension))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::FsAssetStore;
    use crate::asset::{AssetKey, AssetStore};
    use std::fs;
    use uuid::Uuid;

    #[test]
    fn store_replaces_previous_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsAssetStore::open(dir.path()).expect("open");
        let key = AssetKey::card_cover(Uuid::new_v4(), Uuid::new_v4());

        store.store(&key, "png", b"first").expect("store png");
        let stored = store.store(&key, "JPG", b"second").expect("store jpg");

        assert_eq!(stored.extension, "jpg");
        assert!(!dir.path().join(key.relative_path("png")).exists());
        assert_eq!(store.read(&key).expect("read"), Some(b"second".to_vec()));
    }

    #[test]
    fn stale_file_that_cannot_be_removed_does_not_fail_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsAssetStore::open(dir.path()).expect("open");
        let key = AssetKey::card_cover(Uuid::new_v4(), Uuid::new_v4());
        store.store(&key, "png", b"first").expect("store png");

        let stale = dir.path().join(key.relative_path("png"));
        fs::remove_file(&stale).expect("drop png");
        fs::create_dir(&stale).expect("block png path");
        fs::write(stale.join("pinned"), b"x").expect("pin directory");

        let stored = store.store(&key, "jpg", b"second").expect("store jpg");

        assert_eq!(stored.extension, "jpg");
        assert_eq!(store.read(&key).expect("read"), Some(b"second".to_vec()));
        assert!(stale.is_dir());
    }

    #[test]
    fn reopen_rebuilds_index_from_exact_stems() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board_id = Uuid::new_v4();
        let wallpaper = AssetKey::board_wallpaper(board_id);
        let preview = AssetKey::board_wallpaper_preview(board_id);
        {
            let store = FsAssetStore::open(dir.path()).expect("open");
            store.store(&preview, "png", b"small").expect("store preview");
        }
        fs::write(
            dir.path()
                .join("board-wallpapers")
                .join(format!("board-{board_id}-backup.png")),
            b"stray",
        )
        .expect("write stray file");

        let reopened = FsAssetStore::open(dir.path()).expect("reopen");

        assert!(reopened.resolve(&wallpaper).expect("resolve").is_none());
        let resolved = reopened
            .resolve(&preview)
            .expect("resolve")
            .expect("preview indexed");
        assert_eq!(resolved.relative_path, preview.relative_path("png"));
    }

    #[test]
    fn duplicate_copies_bytes_and_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsAssetStore::open(dir.path()).expect("open");
        let board_id = Uuid::new_v4();
        let source = AssetKey::card_cover(board_id, Uuid::new_v4());
        let target = AssetKey::card_cover(board_id, Uuid::new_v4());
        let missing = AssetKey::card_cover(board_id, Uuid::new_v4());

        store.store(&source, "webp", b"cover").expect("store");

        assert!(store.duplicate(&source, &target).expect("duplicate"));
        assert!(!store.duplicate(&missing, &target).expect("duplicate missing"));
        let copied = store.resolve(&target).expect("resolve").expect("copied");
        assert_eq!(copied.extension, "webp");
        assert_eq!(store.read(&target).expect("read"), Some(b"cover".to_vec()));
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsAssetStore::open(dir.path()).expect("open");
        let key = AssetKey::board_wallpaper(Uuid::new_v4());

        store.store(&key, "png", b"wall").expect("store");

        assert!(store.remove(&key).expect("remove"));
        assert!(!store.remove(&key).expect("remove again"));
        assert!(!dir.path().join(key.relative_path("png")).exists());
    }
}
