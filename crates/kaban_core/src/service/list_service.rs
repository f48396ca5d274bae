//! List use cases, including batch renumbering and list copy.
//!
//! # Responsibility
//! - Create, read, patch, archive/restore and soft-delete lists.
//! - Apply batch order-number changes all-or-nothing.
//! - Duplicate a list with its visible cards and their cover images.
//!
//! # Invariants
//! - Archiving a list never changes its cards.
//! - A renumber batch that names an unresolvable id commits nothing.
//! - List copy commits the new list and cards in one transaction; cover
//!   duplication runs after the commit and its failures are only logged.

use super::{found, require_text, ServiceDeps, ServiceResult};
use crate::asset::AssetKey;
use crate::db::write_transaction;
use crate::model::card::{Card, NewCard};
use crate::model::lifecycle::Visibility;
use crate::model::list::{BoardList, ListPatch, ListWithCards, NewList};
use crate::model::{BoardId, EntityKind, ListId, SiblingOrder};
use crate::repo::board_repo::{BoardRepository, SqliteBoardRepository};
use crate::repo::card_repo::{CardRepository, SqliteCardRepository};
use crate::repo::list_repo::{ListRepository, SqliteListRepository};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Result of copying a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCopy {
    /// The new list and its copied cards, in display order.
    pub copy: ListWithCards,
    /// Covers duplicated for the copied cards.
    pub covers_copied: usize,
    /// Covers that could not be duplicated.
    pub cover_failures: usize,
}

/// List service over a migrated connection.
pub struct ListService<'a> {
    deps: ServiceDeps<'a>,
}

impl<'a> ListService<'a> {
    /// Creates a service after checking the connection schema.
    pub fn try_new(deps: ServiceDeps<'a>) -> ServiceResult<Self> {
        SqliteBoardRepository::try_new(deps.conn)?;
        SqliteListRepository::try_new(deps.conn)?;
        SqliteCardRepository::try_new(deps.conn)?;
        Ok(Self { deps })
    }

    /// Loads a visible list with its visible cards.
    pub fn get_list(&self, id: ListId) -> ServiceResult<ListWithCards> {
        let lists = SqliteListRepository::new(self.deps.conn);
        let list = found(lists.load(id, Visibility::Default)?, EntityKind::List, id)?;
        let cards =
            SqliteCardRepository::new(self.deps.conn).list_by_list(id, Visibility::Default)?;
        Ok(ListWithCards { list, cards })
    }

    /// Visible lists of a visible board, ascending by order number.
    pub fn get_lists(&self, board_id: BoardId) -> ServiceResult<Vec<BoardList>> {
        self.require_board(board_id)?;
        let lists = SqliteListRepository::new(self.deps.conn);
        Ok(lists.list_by_board(board_id, Visibility::Default)?)
    }

    /// Archived lists of a visible board, most recently archived first.
    pub fn get_archived_lists(&self, board_id: BoardId) -> ServiceResult<Vec<BoardList>> {
        self.require_board(board_id)?;
        let lists = SqliteListRepository::new(self.deps.conn);
        Ok(lists.list_archived(board_id)?)
    }

    pub fn create_list(&self, list: &NewList) -> ServiceResult<BoardList> {
        require_text("list name", &list.name)?;
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let boards = SqliteBoardRepository::new(&tx);
        found(
            boards.load(list.board_id, Visibility::Live)?,
            EntityKind::Board,
            list.board_id,
        )?;
        let created = SqliteListRepository::new(&tx).insert(list, &ctx)?;
        tx.commit()?;

        info!(
            "event=list_create module=service status=ok list_id={} board_id={}",
            created.id, created.board_id
        );
        Ok(created)
    }

    /// Applies a partial update, including archive and restore.
    ///
    /// Archived lists can be patched; deleted ones report `NotFound`.
    pub fn update_list(&self, id: ListId, patch: &ListPatch) -> ServiceResult<BoardList> {
        if let Some(name) = &patch.name {
            require_text("list name", name)?;
        }
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let repo = SqliteListRepository::new(&tx);
        let mut list = found(repo.load(id, Visibility::Live)?, EntityKind::List, id)?;
        if let Some(name) = &patch.name {
            list.name = name.clone();
        }
        if let Some(order_number) = patch.order_number {
            list.order_number = order_number;
        }
        if let Some(change) = patch.archival {
            list.lifecycle = found(
                list.lifecycle.apply(change, ctx.now()),
                EntityKind::List,
                id,
            )?;
        }
        let updated = repo.update(&list, &ctx)?;
        tx.commit()?;

        info!(
            "event=list_update module=service status=ok list_id={} state={}",
            updated.id,
            updated.lifecycle.state.as_db()
        );
        Ok(updated)
    }

    /// Sets the order numbers of several visible lists at once.
    ///
    /// The first id that does not resolve to a visible list aborts the batch
    /// with `NotFound` for that id, and no order number changes.
    pub fn renumber_lists(&self, orders: &[SiblingOrder]) -> ServiceResult<()> {
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let repo = SqliteListRepository::new(&tx);
        for order in orders {
            repo.set_order_number(order.id, order.order_number, &ctx)?;
        }
        tx.commit()?;

        info!(
            "event=list_renumber module=service status=ok lists={}",
            orders.len()
        );
        Ok(())
    }

    /// Soft-deletes a list whatever its archival state. Unknown ids are a no-op.
    pub fn delete_list(&self, id: ListId) -> ServiceResult<()> {
        let tx = write_transaction(self.deps.conn)?;
        let deleted = SqliteListRepository::new(&tx).mark_deleted(id)?;
        tx.commit()?;

        info!(
            "event=list_delete module=service status=ok list_id={} existed={}",
            id, deleted
        );
        Ok(())
    }

    /// Copies a list and its visible cards under fresh ids.
    ///
    /// The copy keeps name, order number and board; cards keep name,
    /// description and order number. Everything copied starts active and
    /// without comments. A list whose board was deleted cannot be copied.
    pub fn copy_list(&self, id: ListId) -> ServiceResult<ListCopy> {
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let lists = SqliteListRepository::new(&tx);
        let cards = SqliteCardRepository::new(&tx);
        let source = found(lists.load(id, Visibility::Live)?, EntityKind::List, id)?;
        found(
            SqliteBoardRepository::new(&tx).load(source.board_id, Visibility::Live)?,
            EntityKind::Board,
            source.board_id,
        )?;
        let source_cards = cards.list_by_list(source.id, Visibility::Default)?;

        let list = lists.insert(
            &NewList::new(source.board_id, source.name.clone(), source.order_number),
            &ctx,
        )?;
        let mut copied: Vec<(Card, Card)> = Vec::with_capacity(source_cards.len());
        for card in source_cards {
            let new_card = NewCard::new(list.id, card.name.clone(), card.order_number)
                .with_description(card.description.clone());
            let created = cards.insert(&new_card, &ctx)?;
            copied.push((card, created));
        }
        tx.commit()?;

        let board_id = list.board_id;
        let mut covers_copied = 0;
        let mut cover_failures = 0;
        for (source_card, new_card) in &copied {
            let from = AssetKey::card_cover(board_id, source_card.id);
            let to = AssetKey::card_cover(board_id, new_card.id);
            match self.deps.assets.duplicate(&from, &to) {
                Ok(true) => covers_copied += 1,
                Ok(false) => {}
                Err(err) => {
                    cover_failures += 1;
                    warn!(
                        "event=card_cover_copy module=service status=error card_id={} error={}",
                        source_card.id, err
                    );
                }
            }
        }

        info!(
            "event=list_copy module=service status=ok list_id={} source_list_id={} cards={} covers={} cover_failures={}",
            list.id,
            source.id,
            copied.len(),
            covers_copied,
            cover_failures
        );
        Ok(ListCopy {
            copy: ListWithCards {
                list,
                cards: copied.into_iter().map(|(_, created)| created).collect(),
            },
            covers_copied,
            cover_failures,
        })
    }

    fn require_board(&self, board_id: BoardId) -> ServiceResult<()> {
        let boards = SqliteBoardRepository::new(self.deps.conn);
        found(
            boards.load(board_id, Visibility::Default)?,
            EntityKind::Board,
            board_id,
        )?;
        Ok(())
    }
}
