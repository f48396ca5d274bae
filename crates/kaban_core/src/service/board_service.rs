//! Board use cases.
//!
//! # Responsibility
//! - Create, read, patch and soft-delete boards.
//! - Assemble the board page (visible lists with their visible cards).
//! - Store and resolve board wallpapers.
//!
//! # Invariants
//! - Board names are unique among non-deleted boards; violations surface as
//!   `Conflict`.
//! - Boards have no archival state.

use super::{found, require_text, ServiceDeps, ServiceResult};
use crate::asset::{AssetKey, StoredAsset};
use crate::db::write_transaction;
use crate::model::board::{Board, BoardPage, BoardPatch, NewBoard};
use crate::model::lifecycle::Visibility;
use crate::model::list::ListWithCards;
use crate::model::{BoardId, EntityKind, UserId};
use crate::repo::board_repo::{BoardRepository, SqliteBoardRepository};
use crate::repo::card_repo::{CardRepository, SqliteCardRepository};
use crate::repo::list_repo::{ListRepository, SqliteListRepository};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Resolved wallpaper assets of one board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardWallpaper {
    pub wallpaper: Option<StoredAsset>,
    pub preview: Option<StoredAsset>,
}

/// Board service over a migrated connection.
pub struct BoardService<'a> {
    deps: ServiceDeps<'a>,
}

impl<'a> BoardService<'a> {
    /// Creates a service after checking the connection schema.
    pub fn try_new(deps: ServiceDeps<'a>) -> ServiceResult<Self> {
        SqliteBoardRepository::try_new(deps.conn)?;
        SqliteListRepository::try_new(deps.conn)?;
        SqliteCardRepository::try_new(deps.conn)?;
        Ok(Self { deps })
    }

    pub fn get_board(&self, id: BoardId) -> ServiceResult<Board> {
        let repo = SqliteBoardRepository::new(self.deps.conn);
        found(repo.load(id, Visibility::Default)?, EntityKind::Board, id)
    }

    /// Loads a board with its visible lists and cards, both in display order.
    pub fn get_board_page(&self, id: BoardId) -> ServiceResult<BoardPage> {
        let board = self.get_board(id)?;
        let lists = SqliteListRepository::new(self.deps.conn);
        let cards = SqliteCardRepository::new(self.deps.conn);

        let mut page_lists = Vec::new();
        for list in lists.list_by_board(id, Visibility::Default)? {
            let list_cards = cards.list_by_list(list.id, Visibility::Default)?;
            page_lists.push(ListWithCards {
                list,
                cards: list_cards,
            });
        }

        Ok(BoardPage {
            board,
            lists: page_lists,
        })
    }

    /// Lists the visible boards a user created, oldest first.
    pub fn list_boards_created_by(&self, user_id: UserId) -> ServiceResult<Vec<Board>> {
        let repo = SqliteBoardRepository::new(self.deps.conn);
        Ok(repo.list_created_by(user_id)?)
    }

    pub fn create_board(&self, board: &NewBoard) -> ServiceResult<Board> {
        require_text("board name", &board.name)?;
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let created = SqliteBoardRepository::new(&tx).insert(board, &ctx)?;
        tx.commit()?;

        info!(
            "event=board_create module=service status=ok board_id={}",
            created.id
        );
        Ok(created)
    }

    /// Applies a partial update; absent fields keep their stored values.
    pub fn update_board(&self, id: BoardId, patch: &BoardPatch) -> ServiceResult<Board> {
        if let Some(name) = &patch.name {
            require_text("board name", name)?;
        }
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let repo = SqliteBoardRepository::new(&tx);
        let mut board = found(repo.load(id, Visibility::Live)?, EntityKind::Board, id)?;
        if let Some(name) = &patch.name {
            board.name = name.clone();
        }
        if let Some(description) = &patch.description {
            board.description = description.clone();
        }
        let updated = repo.update(&board, &ctx)?;
        tx.commit()?;

        info!(
            "event=board_update module=service status=ok board_id={}",
            updated.id
        );
        Ok(updated)
    }

    /// Soft-deletes a board. Unknown ids are a no-op.
    ///
    /// Lists and cards of the board are left untouched.
    pub fn delete_board(&self, id: BoardId) -> ServiceResult<()> {
        let tx = write_transaction(self.deps.conn)?;
        let deleted = SqliteBoardRepository::new(&tx).mark_deleted(id)?;
        tx.commit()?;

        info!(
            "event=board_delete module=service status=ok board_id={} existed={}",
            id, deleted
        );
        Ok(())
    }

    /// Stores the wallpaper of a visible board together with its preview.
    ///
    /// Without a preview any previously stored preview is removed so the two
    /// never describe different images. The preview is written first: if it
    /// fails the old wallpaper is untouched, and if the wallpaper then fails
    /// the new preview is dropped again.
    pub fn set_board_wallpaper(
        &self,
        id: BoardId,
        extension: &str,
        wallpaper: &[u8],
        preview: Option<&[u8]>,
    ) -> ServiceResult<BoardWallpaper> {
        self.get_board(id)?;

        let assets = self.deps.assets;
        let preview_key = AssetKey::board_wallpaper_preview(id);
        let stored_preview = match preview {
            Some(bytes) => Some(assets.store(&preview_key, extension, bytes)?),
            None => {
                assets.remove(&preview_key)?;
                None
            }
        };
        let stored = match assets.store(&AssetKey::board_wallpaper(id), extension, wallpaper) {
            Ok(stored) => stored,
            Err(err) => {
                if stored_preview.is_some() {
                    if let Err(cleanup) = assets.remove(&preview_key) {
                        warn!(
                            "event=board_wallpaper_set module=service status=error board_id={} stage=preview_cleanup error={}",
                            id, cleanup
                        );
                    }
                }
                return Err(err.into());
            }
        };

        info!(
            "event=board_wallpaper_set module=service status=ok board_id={} preview={}",
            id,
            stored_preview.is_some()
        );
        Ok(BoardWallpaper {
            wallpaper: Some(stored),
            preview: stored_preview,
        })
    }

    /// Resolves the wallpaper assets of a visible board.
    pub fn board_wallpaper(&self, id: BoardId) -> ServiceResult<BoardWallpaper> {
        self.get_board(id)?;
        let assets = self.deps.assets;
        Ok(BoardWallpaper {
            wallpaper: assets.resolve(&AssetKey::board_wallpaper(id))?,
            preview: assets.resolve(&AssetKey::board_wallpaper_preview(id))?,
        })
    }
}
