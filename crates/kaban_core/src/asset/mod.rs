//! Binary assets attached to boards and cards.
//!
//! # Responsibility
//! - Name every asset by an exact [`AssetKey`] instead of a path prefix.
//! - Store, resolve, duplicate and remove asset bytes behind [`AssetStore`].
//!
//! # Invariants
//! - At most one asset exists per key; storing replaces any previous asset
//!   under the same key whatever its extension.
//! - Card covers live under their board's directory, wallpapers are global.
//! - Extensions are lowercase ASCII alphanumerics without a leading dot.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── card-covers/
//! │   └── board-<board_id>/
//! │       └── card-<card_id>.<ext>
//! └── board-wallpapers/
//!     ├── board-<board_id>.<ext>
//!     └── preview-board-<board_id>.<ext>
//! ```

mod fs_store;
mod memory;

pub use fs_store::FsAssetStore;
pub use memory::MemoryAssetStore;

use crate::model::{BoardId, CardId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;

const CARD_COVERS_DIR: &str = "card-covers";
const BOARD_WALLPAPERS_DIR: &str = "board-wallpapers";
const MAX_EXTENSION_CHARS: usize = 10;

pub type AssetResult<T> = Result<T, AssetError>;

/// What an asset depicts. Fixes its file stem and directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    CardCover,
    BoardWallpaper,
    BoardWallpaperPreview,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CardCover => "card_cover",
            Self::BoardWallpaper => "board_wallpaper",
            Self::BoardWallpaperPreview => "board_wallpaper_preview",
        }
    }

    fn stem_prefix(self) -> &'static str {
        match self {
            Self::CardCover => "card-",
            Self::BoardWallpaper => "board-",
            Self::BoardWallpaperPreview => "preview-board-",
        }
    }
}

/// Directory an asset is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "board_id")]
pub enum AssetScope {
    /// Shared across all boards.
    Global,
    /// Private to one board.
    Board(BoardId),
}

/// Exact identity of one stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetKey {
    pub scope: AssetScope,
    pub kind: AssetKind,
    pub entity_id: Uuid,
}

impl AssetKey {
    pub fn card_cover(board_id: BoardId, card_id: CardId) -> Self {
        Self {
            scope: AssetScope::Board(board_id),
            kind: AssetKind::CardCover,
            entity_id: card_id,
        }
    }

    pub fn board_wallpaper(board_id: BoardId) -> Self {
        Self {
            scope: AssetScope::Global,
            kind: AssetKind::BoardWallpaper,
            entity_id: board_id,
        }
    }

    pub fn board_wallpaper_preview(board_id: BoardId) -> Self {
        Self {
            scope: AssetScope::Global,
            kind: AssetKind::BoardWallpaperPreview,
            entity_id: board_id,
        }
    }

    /// File name without extension, e.g. `card-<id>`.
    pub fn file_stem(&self) -> String {
        format!("{}{}", self.kind.stem_prefix(), self.entity_id)
    }

    /// Directory relative to the store root.
    pub fn relative_dir(&self) -> PathBuf {
        match (self.kind, self.scope) {
            (AssetKind::CardCover, AssetScope::Board(board_id)) => {
                PathBuf::from(CARD_COVERS_DIR).join(format!("board-{board_id}"))
            }
            (AssetKind::CardCover, AssetScope::Global) => PathBuf::from(CARD_COVERS_DIR),
            (AssetKind::BoardWallpaper | AssetKind::BoardWallpaperPreview, _) => {
                PathBuf::from(BOARD_WALLPAPERS_DIR)
            }
        }
    }

    /// Path relative to the store root for the given extension.
    pub fn relative_path(&self, extension: &str) -> PathBuf {
        self.relative_dir()
            .join(format!("{}.{extension}", self.file_stem()))
    }

    /// Parses an exact file stem of the given kind. Anything else is `None`.
    pub(crate) fn parse_stem(kind: AssetKind, scope: AssetScope, stem: &str) -> Option<Self> {
        let id = stem.strip_prefix(kind.stem_prefix())?;
        let entity_id = parse_exact_uuid(id)?;
        Some(Self {
            scope,
            kind,
            entity_id,
        })
    }
}

/// Accepts only the canonical lowercase hyphenated rendering.
pub(crate) fn parse_exact_uuid(value: &str) -> Option<Uuid> {
    let parsed = Uuid::parse_str(value).ok()?;
    (parsed.to_string() == value).then_some(parsed)
}

/// Location of a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Path relative to the store root.
    pub relative_path: PathBuf,
    pub extension: String,
}

/// Errors from asset storage.
#[derive(Debug)]
pub enum AssetError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidExtension(String),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for AssetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "asset io failed at `{}`: {source}", path.display())
            }
            Self::InvalidExtension(value) => write!(f, "invalid asset extension `{value}`"),
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidExtension(_) => None,
        }
    }
}

/// Storage for binary assets keyed by [`AssetKey`].
///
/// Implementations must be safe to share between threads; concurrent writes
/// to the same key end in the state of whichever write finished last.
pub trait AssetStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous asset for the key.
    fn store(&self, key: &AssetKey, extension: &str, bytes: &[u8]) -> AssetResult<StoredAsset>;
    /// Resolves the current asset for `key`.
    fn resolve(&self, key: &AssetKey) -> AssetResult<Option<StoredAsset>>;
    /// Reads the bytes of the current asset for `key`.
    fn read(&self, key: &AssetKey) -> AssetResult<Option<Vec<u8>>>;
    /// Copies the asset at `source` to `target`, keeping its extension.
    ///
    /// Returns `false` when `source` has no asset.
    fn duplicate(&self, source: &AssetKey, target: &AssetKey) -> AssetResult<bool>;
    /// Removes the asset for `key`. Returns `false` when there was none.
    fn remove(&self, key: &AssetKey) -> AssetResult<bool>;
}

/// Normalizes a client-supplied extension (`".PNG"` becomes `"png"`).
pub fn normalize_extension(extension: &str) -> AssetResult<String> {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty()
        || trimmed.len() > MAX_EXTENSION_CHARS
        || !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric())
    {
        return Err(AssetError::InvalidExtension(extension.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{normalize_extension, parse_exact_uuid, AssetKey, AssetKind, AssetScope};
    use std::path::PathBuf;
    use uuid::Uuid;

    #[test]
    fn card_cover_lives_under_its_board() {
        let board_id = Uuid::new_v4();
        let card_id = Uuid::new_v4();
        let key = AssetKey::card_cover(board_id, card_id);

        assert_eq!(
            key.relative_path("png"),
            PathBuf::from("card-covers")
                .join(format!("board-{board_id}"))
                .join(format!("card-{card_id}.png"))
        );
    }

    #[test]
    fn wallpaper_and_preview_share_a_directory_but_not_a_stem() {
        let board_id = Uuid::new_v4();
        let wallpaper = AssetKey::board_wallpaper(board_id);
        let preview = AssetKey::board_wallpaper_preview(board_id);

        assert_eq!(wallpaper.relative_dir(), preview.relative_dir());
        assert_eq!(wallpaper.file_stem(), format!("board-{board_id}"));
        assert_eq!(preview.file_stem(), format!("preview-board-{board_id}"));
    }

    #[test]
    fn parse_stem_requires_exact_match() {
        let id = Uuid::new_v4();
        let scope = AssetScope::Global;

        assert!(
            AssetKey::parse_stem(AssetKind::BoardWallpaper, scope, &format!("board-{id}")).is_some()
        );
        assert!(
            AssetKey::parse_stem(AssetKind::BoardWallpaper, scope, &format!("preview-board-{id}"))
                .is_none()
        );
        assert!(
            AssetKey::parse_stem(AssetKind::BoardWallpaper, scope, &format!("board-{id}-old"))
                .is_none()
        );
        assert!(parse_exact_uuid(&id.simple().to_string()).is_none());
    }

    #[test]
    fn extension_is_normalized_and_validated() {
        assert_eq!(normalize_extension(".PNG").expect("valid"), "png");
        assert_eq!(normalize_extension("jpeg").expect("valid"), "jpeg");
        assert!(normalize_extension("").is_err());
        assert!(normalize_extension("../x").is_err());
        assert!(normalize_extension("tar.gz").is_err());
    }
}
