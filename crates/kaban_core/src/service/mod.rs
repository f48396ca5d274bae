//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and asset-store calls into the board use cases.
//! - Resolve the acting user and request time once per call.
//! - Project every failure onto [`ServiceError`].
//!
//! # Invariants
//! - Every create/update/delete/copy/renumber runs in one write
//!   transaction that commits or rolls back as a unit.
//! - Asset-store writes never happen inside a database transaction.
//! - Single-entity reads use default visibility and report `NotFound` for
//!   hidden rows.

pub mod board_service;
pub mod card_service;
pub mod comment_service;
pub mod error;
pub mod list_service;
mod password;
pub mod user_service;

pub use error::{Boundary, ServiceError, ServiceResult};

use crate::asset::AssetStore;
use crate::audit::{Clock, IdentityProvider, RequestContext};
use crate::model::EntityKind;
use rusqlite::Connection;
use uuid::Uuid;

/// Collaborators shared by every service.
#[derive(Clone, Copy)]
pub struct ServiceDeps<'a> {
    pub conn: &'a Connection,
    pub identity: &'a dyn IdentityProvider,
    pub clock: &'a dyn Clock,
    pub assets: &'a dyn AssetStore,
}

impl<'a> ServiceDeps<'a> {
    pub fn new(
        conn: &'a Connection,
        identity: &'a dyn IdentityProvider,
        clock: &'a dyn Clock,
        assets: &'a dyn AssetStore,
    ) -> Self {
        Self {
            conn,
            identity,
            clock,
            assets,
        }
    }

    pub(crate) fn request_context(&self) -> RequestContext {
        RequestContext::resolve(self.identity, self.clock)
    }
}

pub(crate) fn found<T>(value: Option<T>, kind: EntityKind, id: Uuid) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::not_found(kind, id))
}

/// Rejects empty or whitespace-only required text.
pub(crate) fn require_text(field: &'static str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{field} cannot be blank")));
    }
    Ok(())
}
