//! Card repository contract and SQLite implementation.
//!
//! # Invariants
//! - Sibling listing is deterministic: `order_number ASC, seq ASC`.
//! - Archived listing is scoped to one board through the owning list and
//!   ordered `archived_at DESC, seq ASC`.

use super::support::{audit_columns, lifecycle_columns, parse_uuid, uuid_column, AUDIT_COLUMNS};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::audit::RequestContext;
use crate::model::card::{Card, NewCard};
use crate::model::lifecycle::Visibility;
use crate::model::{BoardId, CardId, EntityKind, ListId, OrderNumber};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const CARD_COLUMNS: &[&str] = &[
    "id",
    "list_id",
    "name",
    "description",
    "order_number",
    "state",
    "archived_at",
    "created_by",
    "created_at",
    "last_modified_by",
    "last_modified_at",
];

/// Repository interface for cards.
pub trait CardRepository {
    /// Inserts a new active card under a fresh id.
    fn insert(&self, card: &NewCard, ctx: &RequestContext) -> RepoResult<Card>;
    /// Loads one card if `visibility` admits it.
    fn load(&self, id: CardId, visibility: Visibility) -> RepoResult<Option<Card>>;
    /// Lists the cards of one list admitted by `visibility`, in display order.
    fn list_by_list(&self, list_id: ListId, visibility: Visibility) -> RepoResult<Vec<Card>>;
    /// Lists archived cards of one board, most recently archived first.
    fn list_archived_in_board(&self, board_id: BoardId) -> RepoResult<Vec<Card>>;
    /// Resolves the board owning a card through its list, ignoring visibility.
    fn board_of(&self, id: CardId) -> RepoResult<Option<BoardId>>;
    /// Writes mutable fields and lifecycle and stamps the modifier.
    fn update(&self, card: &Card, ctx: &RequestContext) -> RepoResult<Card>;
    /// Sets the order number of one active card.
    fn set_order_number(
        &self,
        id: CardId,
        order_number: OrderNumber,
        ctx: &RequestContext,
    ) -> RepoResult<()>;
    /// Tombstones a card whatever its state. Returns `false` when no row exists.
    fn mark_deleted(&self, id: CardId) -> RepoResult<bool>;
}

/// SQLite-backed card repository.
pub struct SqliteCardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "cards", CARD_COLUMNS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn insert(&self, card: &NewCard, ctx: &RequestContext) -> RepoResult<Card> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO cards (
                id,
                list_id,
                name,
                description,
                order_number,
                state,
                archived_at,
                created_by,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'active', NULL, (SELECT id FROM users WHERE id = ?6), ?7);",
            params![
                id.to_string(),
                card.list_id.to_string(),
                card.name.as_str(),
                card.description.as_str(),
                card.order_number,
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;

        self.load(id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Card, id))
    }

    fn load(&self, id: CardId, visibility: Visibility) -> RepoResult<Option<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, list_id, name, description, order_number, state, archived_at, {AUDIT_COLUMNS}
             FROM cards
             WHERE id = ?1
               AND {};",
            visibility.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_card_row(row)?));
        }
        Ok(None)
    }

    fn list_by_list(&self, list_id: ListId, visibility: Visibility) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, list_id, name, description, order_number, state, archived_at, {AUDIT_COLUMNS}
             FROM cards
             WHERE list_id = ?1
               AND {}
             ORDER BY order_number ASC, seq ASC;",
            visibility.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([list_id.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    fn list_archived_in_board(&self, board_id: BoardId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT
                c.id AS id,
                c.list_id AS list_id,
                c.name AS name,
                c.description AS description,
                c.order_number AS order_number,
                c.state AS state,
                c.archived_at AS archived_at,
                c.created_by AS created_by,
                c.created_at AS created_at,
                c.last_modified_by AS last_modified_by,
                c.last_modified_at AS last_modified_at
             FROM cards c
             INNER JOIN lists l ON l.id = c.list_id
             WHERE l.board_id = ?1
               AND {}
             ORDER BY c.archived_at DESC, c.seq ASC;",
            Visibility::Archived.sql_predicate("c.state")
        ))?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    fn board_of(&self, id: CardId) -> RepoResult<Option<BoardId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT l.board_id
                 FROM cards c
                 INNER JOIN lists l ON l.id = c.list_id
                 WHERE c.id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|board_id| parse_uuid(&board_id, "lists.board_id"))
            .transpose()
    }

    fn update(&self, card: &Card, ctx: &RequestContext) -> RepoResult<Card> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET list_id = ?2,
                 name = ?3,
                 description = ?4,
                 order_number = ?5,
                 state = ?6,
                 archived_at = ?7,
                 last_modified_by = (SELECT id FROM users WHERE id = ?8),
                 last_modified_at = ?9
             WHERE id = ?1
               AND state <> 'deleted';",
            params![
                card.id.to_string(),
                card.list_id.to_string(),
                card.name.as_str(),
                card.description.as_str(),
                card.order_number,
                card.lifecycle.state.as_db(),
                card.lifecycle.archived_at,
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Card, card.id));
        }

        self.load(card.id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Card, card.id))
    }

    fn set_order_number(
        &self,
        id: CardId,
        order_number: OrderNumber,
        ctx: &RequestContext,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE cards
                 SET order_number = ?2,
                     last_modified_by = (SELECT id FROM users WHERE id = ?3),
                     last_modified_at = ?4
                 WHERE id = ?1
                   AND {};",
                Visibility::Default.sql_predicate("state")
            ),
            params![
                id.to_string(),
                order_number,
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Card, id));
        }
        Ok(())
    }

    fn mark_deleted(&self, id: CardId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE cards SET state = 'deleted' WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    Ok(Card {
        id: uuid_column(row, "id")?,
        list_id: uuid_column(row, "list_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        order_number: row.get("order_number")?,
        lifecycle: lifecycle_columns(row, "cards")?,
        audit: audit_columns(row)?,
    })
}
