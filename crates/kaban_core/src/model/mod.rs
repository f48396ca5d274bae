//! Board/list/card/comment domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep lifecycle (active/archived/deleted) in one explicit state enum.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - `order_number` is a display sort key only; ties are allowed.

pub mod board;
pub mod card;
pub mod comment;
pub mod lifecycle;
pub mod list;
pub mod user;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;
pub type BoardId = Uuid;
pub type ListId = Uuid;
pub type CardId = Uuid;
pub type CommentId = Uuid;

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Client-visible sort key among siblings, ascending.
///
/// Unsigned, so a negative order cannot reach the store.
pub type OrderNumber = u32;

/// Entity kinds tracked by the store. Used in errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Board,
    List,
    Card,
    Comment,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Board => "board",
            Self::List => "list",
            Self::Card => "card",
            Self::Comment => "comment",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(entity id, new order number)` pair of a batch renumber request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingOrder {
    pub id: Uuid,
    pub order_number: OrderNumber,
}

impl SiblingOrder {
    pub fn new(id: Uuid, order_number: OrderNumber) -> Self {
        Self { id, order_number }
    }
}
