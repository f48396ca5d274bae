//! Row decoding and schema guards shared by the SQLite repositories.

use super::{RepoError, RepoResult};
use crate::audit::AuditTrail;
use crate::db::migrations::latest_version;
use crate::model::lifecycle::{EntityState, Lifecycle};
use rusqlite::{ffi, Connection, ErrorCode, Row};
use uuid::Uuid;

/// Audit columns, in the order every auditable `SELECT` lists them.
pub(crate) const AUDIT_COLUMNS: &str = "created_by, created_at, last_modified_by, last_modified_at";

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn uuid_column(row: &Row<'_>, column: &'static str) -> RepoResult<Uuid> {
    let value: String = row.get(column)?;
    parse_uuid(&value, column)
}

pub(crate) fn optional_uuid_column(row: &Row<'_>, column: &'static str) -> RepoResult<Option<Uuid>> {
    row.get::<_, Option<String>>(column)?
        .map(|value| parse_uuid(&value, column))
        .transpose()
}

pub(crate) fn state_column(row: &Row<'_>, table: &'static str) -> RepoResult<EntityState> {
    let value: String = row.get("state")?;
    EntityState::from_db(&value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid state `{value}` in {table}.state"))
    })
}

pub(crate) fn lifecycle_columns(row: &Row<'_>, table: &'static str) -> RepoResult<Lifecycle> {
    let lifecycle = Lifecycle {
        state: state_column(row, table)?,
        archived_at: row.get("archived_at")?,
    };
    if !lifecycle.is_consistent() {
        return Err(RepoError::InvalidData(format!(
            "state `{}` does not match archived_at in {table}",
            lifecycle.state.as_db()
        )));
    }
    Ok(lifecycle)
}

pub(crate) fn audit_columns(row: &Row<'_>) -> RepoResult<AuditTrail> {
    Ok(AuditTrail {
        created_by: optional_uuid_column(row, "created_by")?,
        created_at: row.get("created_at")?,
        last_modified_by: optional_uuid_column(row, "last_modified_by")?,
        last_modified_at: row.get("last_modified_at")?,
    })
}

/// Maps a UNIQUE violation to `Conflict`, passing other errors through.
pub(crate) fn map_unique_violation(
    err: rusqlite::Error,
    message: impl FnOnce() -> String,
) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Conflict(message())
        }
        _ => err.into(),
    }
}

/// Verifies the connection is migrated and carries the expected table shape.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let present = table_columns(conn, table)?;
    for column in columns {
        if !present.iter().any(|current| current == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}
