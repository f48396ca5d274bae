//! Card use cases.
//!
//! # Responsibility
//! - Create, read, patch, move, archive/restore and soft-delete cards.
//! - Apply batch order-number changes all-or-nothing.
//! - Store and resolve card cover images.
//!
//! # Invariants
//! - A card only moves between non-deleted lists of its own board.
//! - A card's cover is keyed by its board and its id, so moving it between
//!   lists keeps the cover.

use super::{found, require_text, ServiceDeps, ServiceError, ServiceResult};
use crate::asset::{AssetKey, StoredAsset};
use crate::db::write_transaction;
use crate::model::card::{Card, CardPatch, NewCard};
use crate::model::lifecycle::Visibility;
use crate::model::{BoardId, CardId, EntityKind, ListId, SiblingOrder};
use crate::repo::board_repo::{BoardRepository, SqliteBoardRepository};
use crate::repo::card_repo::{CardRepository, SqliteCardRepository};
use crate::repo::list_repo::{ListRepository, SqliteListRepository};
use log::info;

/// Card service over a migrated connection.
pub struct CardService<'a> {
    deps: ServiceDeps<'a>,
}

impl<'a> CardService<'a> {
    /// Creates a service after checking the connection schema.
    pub fn try_new(deps: ServiceDeps<'a>) -> ServiceResult<Self> {
        SqliteBoardRepository::try_new(deps.conn)?;
        SqliteListRepository::try_new(deps.conn)?;
        SqliteCardRepository::try_new(deps.conn)?;
        Ok(Self { deps })
    }

    pub fn get_card(&self, id: CardId) -> ServiceResult<Card> {
        let repo = SqliteCardRepository::new(self.deps.conn);
        found(repo.load(id, Visibility::Default)?, EntityKind::Card, id)
    }

    /// Visible cards of a visible list, ascending by order number.
    pub fn get_cards(&self, list_id: ListId) -> ServiceResult<Vec<Card>> {
        let lists = SqliteListRepository::new(self.deps.conn);
        found(
            lists.load(list_id, Visibility::Default)?,
            EntityKind::List,
            list_id,
        )?;
        let repo = SqliteCardRepository::new(self.deps.conn);
        Ok(repo.list_by_list(list_id, Visibility::Default)?)
    }

    /// Archived cards anywhere in a visible board, most recently archived first.
    pub fn get_archived_cards(&self, board_id: BoardId) -> ServiceResult<Vec<Card>> {
        let boards = SqliteBoardRepository::new(self.deps.conn);
        found(
            boards.load(board_id, Visibility::Default)?,
            EntityKind::Board,
            board_id,
        )?;
        let repo = SqliteCardRepository::new(self.deps.conn);
        Ok(repo.list_archived_in_board(board_id)?)
    }

    pub fn create_card(&self, card: &NewCard) -> ServiceResult<Card> {
        require_text("card name", &card.name)?;
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let lists = SqliteListRepository::new(&tx);
        found(
            lists.load(card.list_id, Visibility::Live)?,
            EntityKind::List,
            card.list_id,
        )?;
        let created = SqliteCardRepository::new(&tx).insert(card, &ctx)?;
        tx.commit()?;

        info!(
            "event=card_create module=service status=ok card_id={} list_id={}",
            created.id, created.list_id
        );
        Ok(created)
    }

    /// Applies a partial update, including moves, archive and restore.
    ///
    /// Archived cards can be patched; deleted ones report `NotFound`. A move
    /// to a list outside the card's board, or to a deleted list, is rejected
    /// with `Validation`.
    pub fn update_card(&self, id: CardId, patch: &CardPatch) -> ServiceResult<Card> {
        if let Some(name) = &patch.name {
            require_text("card name", name)?;
        }
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let cards = SqliteCardRepository::new(&tx);
        let mut card = found(cards.load(id, Visibility::Live)?, EntityKind::Card, id)?;

        if let Some(target_list_id) = patch.list_id {
            if target_list_id != card.list_id {
                let board_id = found(cards.board_of(id)?, EntityKind::Card, id)?;
                let lists = SqliteListRepository::new(&tx);
                let target = lists
                    .load(target_list_id, Visibility::Live)?
                    .filter(|list| list.board_id == board_id)
                    .ok_or_else(|| {
                        ServiceError::validation(format!(
                            "list {target_list_id} is not a list of board {board_id}"
                        ))
                    })?;
                card.list_id = target.id;
            }
        }
        if let Some(name) = &patch.name {
            card.name = name.clone();
        }
        if let Some(description) = &patch.description {
            card.description = description.clone();
        }
        if let Some(order_number) = patch.order_number {
            card.order_number = order_number;
        }
        if let Some(change) = patch.archival {
            card.lifecycle = found(
                card.lifecycle.apply(change, ctx.now()),
                EntityKind::Card,
                id,
            )?;
        }
        let updated = cards.update(&card, &ctx)?;
        tx.commit()?;

        info!(
            "event=card_update module=service status=ok card_id={} list_id={} state={}",
            updated.id,
            updated.list_id,
            updated.lifecycle.state.as_db()
        );
        Ok(updated)
    }

    /// Sets the order numbers of several visible cards at once.
    ///
    /// The first id that does not resolve to a visible card aborts the batch
    /// with `NotFound` for that id, and no order number changes.
    pub fn renumber_cards(&self, orders: &[SiblingOrder]) -> ServiceResult<()> {
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let repo = SqliteCardRepository::new(&tx);
        for order in orders {
            repo.set_order_number(order.id, order.order_number, &ctx)?;
        }
        tx.commit()?;

        info!(
            "event=card_renumber module=service status=ok cards={}",
            orders.len()
        );
        Ok(())
    }

    /// Soft-deletes a card whatever its archival state. Unknown ids are a no-op.
    ///
    /// The cover image is kept.
    pub fn delete_card(&self, id: CardId) -> ServiceResult<()> {
        let tx = write_transaction(self.deps.conn)?;
        let deleted = SqliteCardRepository::new(&tx).mark_deleted(id)?;
        tx.commit()?;

        info!(
            "event=card_delete module=service status=ok card_id={} existed={}",
            id, deleted
        );
        Ok(())
    }

    /// Stores or replaces the cover image of a visible card.
    pub fn set_card_cover(
        &self,
        id: CardId,
        extension: &str,
        bytes: &[u8],
    ) -> ServiceResult<StoredAsset> {
        let key = self.cover_key(id)?;
        let stored = self.deps.assets.store(&key, extension, bytes)?;

        info!(
            "event=card_cover_set module=service status=ok card_id={} bytes={}",
            id,
            bytes.len()
        );
        Ok(stored)
    }

    /// Resolves the cover image of a visible card, if it has one.
    pub fn card_cover(&self, id: CardId) -> ServiceResult<Option<StoredAsset>> {
        let key = self.cover_key(id)?;
        Ok(self.deps.assets.resolve(&key)?)
    }

    fn cover_key(&self, id: CardId) -> ServiceResult<AssetKey> {
        self.get_card(id)?;
        let repo = SqliteCardRepository::new(self.deps.conn);
        let board_id = found(repo.board_of(id)?, EntityKind::Card, id)?;
        Ok(AssetKey::card_cover(board_id, id))
    }
}
