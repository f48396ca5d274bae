//! Service error taxonomy and its boundary projection.

use crate::asset::AssetError;
use crate::db::DbError;
use crate::model::EntityKind;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of one use case.
#[derive(Debug)]
pub enum ServiceError {
    /// Entity absent or filtered out by visibility rules.
    NotFound { kind: EntityKind, id: Uuid },
    /// Input rejected before any write happened.
    Validation(String),
    /// Store-level uniqueness violation.
    Conflict(String),
    /// Asset store read/write failure.
    Io(AssetError),
    /// Storage failure other than the semantic cases above.
    Storage(RepoError),
}

/// Caller-facing classification of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    NotFound(String),
    BadRequest(String),
}

impl ServiceError {
    pub(crate) fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Projects this error onto the two failure outcomes a caller can see.
    pub fn boundary(&self) -> Boundary {
        match self {
            Self::NotFound { .. } => Boundary::NotFound(self.to_string()),
            _ => Boundary::BadRequest(self.to_string()),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Storage(other),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Storage(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(RepoError::from(value))
    }
}

impl From<AssetError> for ServiceError {
    fn from(value: AssetError) -> Self {
        match value {
            AssetError::InvalidExtension(_) => Self::Validation(value.to_string()),
            other => Self::Io(other),
        }
    }
}
