//! Core domain logic for Kaban boards.
//! This crate is the single source of truth for board, list, card and
//! comment lifecycle, ordering, audit and copy invariants.

pub mod asset;
pub mod audit;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use asset::{AssetKey, AssetKind, AssetStore, FsAssetStore, MemoryAssetStore, StoredAsset};
pub use audit::{
    Anonymous, Clock, IdentityProvider, ManualClock, RequestContext, StaticIdentity, SystemClock,
};
pub use crate::config::KabanConfig;
pub use db::{open_db, open_db_in_memory};
pub use logging::{
    init_from_settings, init_logging, logging_status, ActiveLogging, LogLevel, LoggingError,
};
pub use model::lifecycle::{ArchivalChange, EntityState, Lifecycle, Visibility};
pub use model::{
    BoardId, CardId, CommentId, EntityKind, ListId, OrderNumber, SiblingOrder, UserId,
};
pub use repo::{RepoError, RepoResult};
pub use service::board_service::BoardService;
pub use service::card_service::CardService;
pub use service::comment_service::CommentService;
pub use service::list_service::{ListCopy, ListService};
pub use service::user_service::UserService;
pub use service::{Boundary, ServiceDeps, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
