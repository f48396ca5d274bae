//! User account model.
//!
//! # Invariants
//! - `username` and `email` are unique across all users, deleted included.
//! - Password material never leaves core through serialization.

use super::lifecycle::EntityState;
use super::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string.
    #[serde(skip)]
    pub password_hash: String,
    /// Salt embedded in `password_hash`, kept as its own column.
    #[serde(skip)]
    pub password_salt: String,
    pub state: EntityState,
}

/// Input for user registration; the password travels separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

/// Partial user update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}
