//! List repository contract and SQLite implementation.
//!
//! # Invariants
//! - Sibling listing is deterministic: `order_number ASC, seq ASC`, so ties
//!   fall back to insertion order.
//! - Archived listing is `archived_at DESC, seq ASC`.
//! - `board_id` is never rewritten after insertion.

use super::support::{audit_columns, lifecycle_columns, uuid_column, AUDIT_COLUMNS};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::audit::RequestContext;
use crate::model::lifecycle::Visibility;
use crate::model::list::{BoardList, NewList};
use crate::model::{BoardId, EntityKind, ListId, OrderNumber};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const LIST_COLUMNS: &[&str] = &[
    "id",
    "board_id",
    "name",
    "order_number",
    "state",
    "archived_at",
    "created_by",
    "created_at",
    "last_modified_by",
    "last_modified_at",
];

/// Repository interface for lists.
pub trait ListRepository {
    /// Inserts a new active list under a fresh id.
    fn insert(&self, list: &NewList, ctx: &RequestContext) -> RepoResult<BoardList>;
    /// Loads one list if `visibility` admits it.
    fn load(&self, id: ListId, visibility: Visibility) -> RepoResult<Option<BoardList>>;
    /// Lists the lists of one board admitted by `visibility`, in display order.
    fn list_by_board(
        &self,
        board_id: BoardId,
        visibility: Visibility,
    ) -> RepoResult<Vec<BoardList>>;
    /// Lists archived lists of one board, most recently archived first.
    fn list_archived(&self, board_id: BoardId) -> RepoResult<Vec<BoardList>>;
    /// Writes name, order and lifecycle and stamps the modifier.
    fn update(&self, list: &BoardList, ctx: &RequestContext) -> RepoResult<BoardList>;
    /// Sets the order number of one active list.
    fn set_order_number(
        &self,
        id: ListId,
        order_number: OrderNumber,
        ctx: &RequestContext,
    ) -> RepoResult<()>;
    /// Tombstones a list whatever its state. Returns `false` when no row exists.
    fn mark_deleted(&self, id: ListId) -> RepoResult<bool>;
}

/// SQLite-backed list repository.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "lists", LIST_COLUMNS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_lists(&self, sql: &str, board_id: BoardId) -> RepoResult<Vec<BoardList>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn insert(&self, list: &NewList, ctx: &RequestContext) -> RepoResult<BoardList> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO lists (
                id,
                board_id,
                name,
                order_number,
                state,
                archived_at,
                created_by,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, 'active', NULL, (SELECT id FROM users WHERE id = ?5), ?6);",
            params![
                id.to_string(),
                list.board_id.to_string(),
                list.name.as_str(),
                list.order_number,
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;

        self.load(id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::List, id))
    }

    fn load(&self, id: ListId, visibility: Visibility) -> RepoResult<Option<BoardList>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, board_id, name, order_number, state, archived_at, {AUDIT_COLUMNS}
             FROM lists
             WHERE id = ?1
               AND {};",
            visibility.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }
        Ok(None)
    }

    fn list_by_board(
        &self,
        board_id: BoardId,
        visibility: Visibility,
    ) -> RepoResult<Vec<BoardList>> {
        self.query_lists(
            &format!(
                "SELECT id, board_id, name, order_number, state, archived_at, {AUDIT_COLUMNS}
                 FROM lists
                 WHERE board_id = ?1
                   AND {}
                 ORDER BY order_number ASC, seq ASC;",
                visibility.sql_predicate("state")
            ),
            board_id,
        )
    }

    fn list_archived(&self, board_id: BoardId) -> RepoResult<Vec<BoardList>> {
        self.query_lists(
            &format!(
                "SELECT id, board_id, name, order_number, state, archived_at, {AUDIT_COLUMNS}
                 FROM lists
                 WHERE board_id = ?1
                   AND {}
                 ORDER BY archived_at DESC, seq ASC;",
                Visibility::Archived.sql_predicate("state")
            ),
            board_id,
        )
    }

    fn update(&self, list: &BoardList, ctx: &RequestContext) -> RepoResult<BoardList> {
        let changed = self.conn.execute(
            "UPDATE lists
             SET name = ?2,
                 order_number = ?3,
                 state = ?4,
                 archived_at = ?5,
                 last_modified_by = (SELECT id FROM users WHERE id = ?6),
                 last_modified_at = ?7
             WHERE id = ?1
               AND state <> 'deleted';",
            params![
                list.id.to_string(),
                list.name.as_str(),
                list.order_number,
                list.lifecycle.state.as_db(),
                list.lifecycle.archived_at,
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::List, list.id));
        }

        self.load(list.id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::List, list.id))
    }

    fn set_order_number(
        &self,
        id: ListId,
        order_number: OrderNumber,
        ctx: &RequestContext,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE lists
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
            return Err(RepoError::not_found(EntityKind::List, id));
        }
        Ok(())
    }

    fn mark_deleted(&self, id: ListId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE lists SET state = 'deleted' WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<BoardList> {
    Ok(BoardList {
        id: uuid_column(row, "id")?,
        board_id: uuid_column(row, "board_id")?,
        name: row.get("name")?,
        order_number: row.get("order_number")?,
        lifecycle: lifecycle_columns(row, "lists")?,
        audit: audit_columns(row)?,
    })
}
