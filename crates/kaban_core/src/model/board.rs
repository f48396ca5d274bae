//! Board entity: the top-level container of lists.

use super::lifecycle::EntityState;
use super::list::ListWithCards;
use super::BoardId;
use crate::audit::AuditTrail;
use serde::{Deserialize, Serialize};

/// Persisted board. Boards have no archival state, only soft-delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub description: String,
    pub state: EntityState,
    pub audit: AuditTrail,
}

/// Input for board creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBoard {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewBoard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial board update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A board with its visible lists, each with its visible cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPage {
    pub board: Board,
    pub lists: Vec<ListWithCards>,
}
