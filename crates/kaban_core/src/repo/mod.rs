//! Repository layer: the persistent entity store.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Keep SQLite query details away from service orchestration.
//!
//! # Invariants
//! - Reads go through a [`Visibility`](crate::model::lifecycle::Visibility)
//!   and never return rows the visibility does not admit.
//! - Writes stamp audit columns from the caller's `RequestContext`.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod board_repo;
pub mod card_repo;
pub mod comment_repo;
pub mod list_repo;
mod support;
pub mod user_repo;

use crate::db::DbError;
use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub(crate) use support::ensure_connection_ready;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from entity store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist or is not admitted by the requested visibility.
    NotFound { kind: EntityKind, id: Uuid },
    /// A store-level uniqueness constraint rejected the write.
    Conflict(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub(crate) fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
