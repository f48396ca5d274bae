//! Card entity: a work item within a list.

use super::lifecycle::{ArchivalChange, Lifecycle};
use super::{CardId, ListId, OrderNumber};
use crate::audit::AuditTrail;
use serde::{Deserialize, Serialize};

/// Persisted card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub name: String,
    pub description: String,
    pub order_number: OrderNumber,
    pub lifecycle: Lifecycle,
    pub audit: AuditTrail,
}

/// Input for card creation. The caller owns the order number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub list_id: ListId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub order_number: OrderNumber,
}

impl NewCard {
    pub fn new(list_id: ListId, name: impl Into<String>, order_number: OrderNumber) -> Self {
        Self {
            list_id,
            name: name.into(),
            description: String::new(),
            order_number,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial card update. `None` leaves a field untouched.
///
/// `list_id` moves the card to another list of the same board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order_number: Option<OrderNumber>,
    pub list_id: Option<ListId>,
    pub archival: Option<ArchivalChange>,
}
