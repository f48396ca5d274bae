//! Card comment repository contract and SQLite implementation.

use super::support::{audit_columns, state_column, uuid_column, AUDIT_COLUMNS};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::audit::RequestContext;
use crate::model::comment::{CardComment, NewComment};
use crate::model::lifecycle::Visibility;
use crate::model::{CardId, CommentId, EntityKind};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const COMMENT_COLUMNS: &[&str] = &[
    "id",
    "card_id",
    "text",
    "state",
    "created_by",
    "created_at",
    "last_modified_by",
    "last_modified_at",
];

/// Repository interface for card comments.
pub trait CommentRepository {
    fn insert(&self, comment: &NewComment, ctx: &RequestContext) -> RepoResult<CardComment>;
    fn load(&self, id: CommentId, visibility: Visibility) -> RepoResult<Option<CardComment>>;
    /// Active comments of one card, oldest first.
    fn list_by_card(&self, card_id: CardId) -> RepoResult<Vec<CardComment>>;
    fn update(&self, comment: &CardComment, ctx: &RequestContext) -> RepoResult<CardComment>;
    /// Returns `false` when no row exists.
    fn mark_deleted(&self, id: CommentId) -> RepoResult<bool>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "card_comments", COMMENT_COLUMNS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn insert(&self, comment: &NewComment, ctx: &RequestContext) -> RepoResult<CardComment> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO card_comments (id, card_id, text, state, created_by, created_at)
             VALUES (?1, ?2, ?3, 'active', (SELECT id FROM users WHERE id = ?4), ?5);",
            params![
                id.to_string(),
                comment.card_id.to_string(),
                comment.text.as_str(),
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;

        self.load(id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Comment, id))
    }

    fn load(&self, id: CommentId, visibility: Visibility) -> RepoResult<Option<CardComment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, card_id, text, state, {AUDIT_COLUMNS}
             FROM card_comments
             WHERE id = ?1
               AND {};",
            visibility.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_by_card(&self, card_id: CardId) -> RepoResult<Vec<CardComment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, card_id, text, state, {AUDIT_COLUMNS}
             FROM card_comments
             WHERE card_id = ?1
               AND {}
             ORDER BY seq ASC;",
            Visibility::Default.sql_predicate("state")
        ))?;
        let mut rows = stmt.query([card_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn update(&self, comment: &CardComment, ctx: &RequestContext) -> RepoResult<CardComment> {
        let changed = self.conn.execute(
            "UPDATE card_comments
             SET text = ?2,
                 last_modified_by = (SELECT id FROM users WHERE id = ?3),
                 last_modified_at = ?4
             WHERE id = ?1
               AND state <> 'deleted';",
            params![
                comment.id.to_string(),
                comment.text.as_str(),
                ctx.actor().map(|actor| actor.to_string()),
                ctx.now(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Comment, comment.id));
        }

        self.load(comment.id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Comment, comment.id))
    }

    fn mark_deleted(&self, id: CommentId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE card_comments SET state = 'deleted' WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<CardComment> {
    Ok(CardComment {
        id: uuid_column(row, "id")?,
        card_id: uuid_column(row, "card_id")?,
        text: row.get("text")?,
        state: state_column(row, "card_comments")?,
        audit: audit_columns(row)?,
    })
}
