//! Entity lifecycle state and the visibility filter.
//!
//! # Responsibility
//! - Replace the `is_deleted`/`is_archived` flag pair with one state enum.
//! - Implement the archival state machine (`Active <-> Archived`).
//! - Decide which states a read admits, both in memory and in SQL.
//!
//! # Invariants
//! - `Archived` iff `archived_at` is set, for every non-deleted row.
//! - `Deleted` is terminal: no transition leaves it.
//! - Default reads admit `Active` only.

use super::Timestamp;
use serde::{Deserialize, Serialize};

/// Persistent lifecycle state shared by every entity kind.
///
/// Boards, comments and users only ever use `Active` and `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    Active,
    Archived,
    Deleted,
}

impl EntityState {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn is_deleted(self) -> bool {
        self == Self::Deleted
    }
}

/// Which lifecycle states a read is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Active rows only. Every get-by-id / get-children read uses this.
    Default,
    /// Archived, non-deleted rows. Backs the "get archived" queries.
    Archived,
    /// Active or archived rows. Used to load the target of an update so an
    /// archived row can still be edited or restored.
    Live,
    /// Everything, tombstones included. Used by delete lookups.
    IncludeHidden,
}

impl Visibility {
    /// Pure visibility predicate over a lifecycle state.
    pub fn admits(self, state: EntityState) -> bool {
        match self {
            Self::Default => state == EntityState::Active,
            Self::Archived => state == EntityState::Archived,
            Self::Live => state != EntityState::Deleted,
            Self::IncludeHidden => true,
        }
    }

    /// SQL rendering of [`Visibility::admits`] for the given state column.
    pub(crate) fn sql_predicate(self, state_column: &str) -> String {
        match self {
            Self::Default => format!("{state_column} = 'active'"),
            Self::Archived => format!("{state_column} = 'archived'"),
            Self::Live => format!("{state_column} <> 'deleted'"),
            Self::IncludeHidden => "1 = 1".to_string(),
        }
    }
}

/// Requested archival transition carried by a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchivalChange {
    Archive,
    Restore,
}

impl ArchivalChange {
    /// Maps the wire-level `is_archived` flag onto a transition.
    pub fn from_flag(is_archived: bool) -> Self {
        if is_archived {
            Self::Archive
        } else {
            Self::Restore
        }
    }
}

/// Lifecycle of an archivable entity (lists and cards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub state: EntityState,
    pub archived_at: Option<Timestamp>,
}

impl Lifecycle {
    pub fn active() -> Self {
        Self {
            state: EntityState::Active,
            archived_at: None,
        }
    }

    /// Checks the state/timestamp pairing invariant.
    pub fn is_consistent(&self) -> bool {
        match self.state {
            EntityState::Active => self.archived_at.is_none(),
            EntityState::Archived => self.archived_at.is_some(),
            EntityState::Deleted => true,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.state == EntityState::Archived
    }

    /// Applies an archival transition.
    ///
    /// Archiving stamps `archived_at = now`; restoring clears it. Repeating
    /// the current state is a no-op, so an archived row keeps its original
    /// `archived_at`. Returns `None` for tombstoned rows.
    pub fn apply(self, change: ArchivalChange, now: Timestamp) -> Option<Self> {
        match (self.state, change) {
            (EntityState::Deleted, _) => None,
            (EntityState::Active, ArchivalChange::Archive) => Some(Self {
                state: EntityState::Archived,
                archived_at: Some(now),
            }),
            (EntityState::Archived, ArchivalChange::Restore) => Some(Self::active()),
            (EntityState::Active, ArchivalChange::Restore)
            | (EntityState::Archived, ArchivalChange::Archive) => Some(self),
        }
    }
}
