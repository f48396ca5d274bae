//! Card comment entity.

use super::lifecycle::EntityState;
use super::{CardId, CommentId};
use crate::audit::AuditTrail;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardComment {
    pub id: CommentId,
    pub card_id: CardId,
    pub text: String,
    pub state: EntityState,
    pub audit: AuditTrail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub card_id: CardId,
    pub text: String,
}

impl NewComment {
    pub fn new(card_id: CardId, text: impl Into<String>) -> Self {
        Self {
            card_id,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPatch {
    pub text: Option<String>,
}
