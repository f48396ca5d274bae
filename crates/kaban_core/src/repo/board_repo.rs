//! Board repository contract and SQLite implementation.
//!
//! # Invariants
//! - Board names are unique among non-deleted boards (partial unique index).
//! - Boards only ever hold `active` or `deleted` state.

use super::support::{
    audit_columns, map_unique_violation, state_column, uuid_column, AUDIT_COLUMNS,
};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::audit::RequestContext;
use crate::model::board::{Board, NewBoard};
use crate::model::lifecycle::Visibility;
use crate::model::{BoardId, EntityKind, UserId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const BOARD_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "state",
    "created_by",
    "created_at",
    "last_modified_by",
    "last_modified_at",
];

/// Repository interface for boards.
pub trait BoardRepository {
    /// Inserts a new active board under a fresh id.
    fn insert(&self, board: &NewBoard, ctx: &RequestContext) -> RepoResult<Board>;
    /// Loads one board if `visibility` admits it.
    fn load(&self, id: BoardId, visibility: Visibility) -> RepoResult<Option<Board>>;
    /// Lists active boards created by one user, oldest first.
    fn list_created_by(&self, user_id: UserId) -> RepoResult<Vec<Board>>;
    /// Writes mutable fields and stamps the modifier.
    fn update(&self, board: &Board, ctx: &RequestContext) -> RepoResult<Board>;
    /// Tombstones a board. Returns `false` when no row exists.
    fn mark_deleted(&self, id: BoardId) -> RepoResult<bool>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "boards", BOARD_COLUMNS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn insert(&self, board: &NewBoard, ctx: &RequestContext) -> RepoResult<Board> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO boards (id, name, description, state, created_by, created_at)
                 VALUES (?1, ?2, ?3, 'active', (SELECT id FROM users WHERE id = ?4), ?5);",
                params![
                    id.to_string(),
                    board.name.as_str(),
                    board.description.as_str(),
                    ctx.actor().map(|actor| actor.to_string()),
                    ctx.now(),
                ],
            )
            .map_err(|err| map_unique_violation(err, || duplicate_name(&board.name)))?;

        self.load(id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Board, id))
    }

    fn load(&self, id: BoardId, visibility: Visibility) -> RepoResult<Option<Board>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, description, state, {AUDIT_COLUMNS}
             FROM boards
             WHERE id = ?1
               AND {};",
            visibility.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_board_row(row)?));
        }
        Ok(None)
    }

    fn list_created_by(&self, user_id: UserId) -> RepoResult<Vec<Board>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, description, state, {AUDIT_COLUMNS}
             FROM boards
             WHERE created_by = ?1
               AND {}
             ORDER BY seq ASC;",
            Visibility::Default.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut boards = Vec::new();
        while let Some(row) = rows.next()? {
            boards.push(parse_board_row(row)?);
        }
        Ok(boards)
    }

    fn update(&self, board: &Board, ctx: &RequestContext) -> RepoResult<Board> {
        let changed = self
            .conn
            .execute(
                "UPDATE boards
                 SET name = ?2,
                     description = ?3,
                     last_modified_by = (SELECT id FROM users WHERE id = ?4),
                     last_modified_at = ?5
                 WHERE id = ?1
                   AND state <> 'deleted';",
                params![
                    board.id.to_string(),
                    board.name.as_str(),
                    board.description.as_str(),
                    ctx.actor().map(|actor| actor.to_string()),
                    ctx.now(),
                ],
            )
            .map_err(|err| map_unique_violation(err, || duplicate_name(&board.name)))?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Board, board.id));
        }

        self.load(board.id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Board, board.id))
    }

    fn mark_deleted(&self, id: BoardId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE boards SET state = 'deleted' WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn duplicate_name(name: &str) -> String {
    format!("board with name `{name}` already exists")
}

fn parse_board_row(row: &Row<'_>) -> RepoResult<Board> {
    Ok(Board {
        id: uuid_column(row, "id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        state: state_column(row, "boards")?,
        audit: audit_columns(row)?,
    })
}
