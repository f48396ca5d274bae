//! List entity: an ordered column of cards within a board.

use super::card::Card;
use super::lifecycle::{ArchivalChange, Lifecycle};
use super::{BoardId, ListId, OrderNumber};
use crate::audit::AuditTrail;
use serde::{Deserialize, Serialize};

/// Persisted list.
///
/// `board_id` is fixed at creation; nothing in core moves a list to
/// another board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: ListId,
    pub board_id: BoardId,
    pub name: String,
    pub order_number: OrderNumber,
    pub lifecycle: Lifecycle,
    pub audit: AuditTrail,
}

/// Input for list creation. The caller owns the order number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewList {
    pub board_id: BoardId,
    pub name: String,
    pub order_number: OrderNumber,
}

impl NewList {
    pub fn new(board_id: BoardId, name: impl Into<String>, order_number: OrderNumber) -> Self {
        Self {
            board_id,
            name: name.into(),
            order_number,
        }
    }
}

/// Partial list update. `None` leaves a field untouched.
///
/// Archiving a list does not archive its cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPatch {
    pub name: Option<String>,
    pub order_number: Option<OrderNumber>,
    pub archival: Option<ArchivalChange>,
}

/// A list together with its visible cards, ascending by order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWithCards {
    pub list: BoardList,
    pub cards: Vec<Card>,
}
