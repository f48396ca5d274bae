//! User account repository contract and SQLite implementation.
//!
//! # Invariants
//! - `username` and `email` are unique across all rows; collisions surface
//!   as [`RepoError::Conflict`].
//! - Password hashing happens above this layer; rows only store the result.

use super::support::{map_unique_violation, state_column, uuid_column};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::lifecycle::Visibility;
use crate::model::user::{NewUser, User};
use crate::model::{EntityKind, UserId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "username",
    "email",
    "password_hash",
    "password_salt",
    "state",
];

const USER_SELECT: &str = "SELECT id, first_name, last_name, username, email, password_hash, password_salt, state
     FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Inserts a new active user with already-derived password material.
    fn insert(
        &self,
        user: &NewUser,
        password_hash: &str,
        password_salt: &str,
    ) -> RepoResult<User>;
    fn load(&self, id: UserId, visibility: Visibility) -> RepoResult<Option<User>>;
    /// Looks up an active user by email address.
    fn load_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Writes every mutable field, password material included.
    fn update(&self, user: &User) -> RepoResult<User>;
    /// Returns `false` when no row exists.
    fn mark_deleted(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "users", USER_COLUMNS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(&self, sql: &str, value: &str) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert(
        &self,
        user: &NewUser,
        password_hash: &str,
        password_salt: &str,
    ) -> RepoResult<User> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO users (
                    id,
                    first_name,
                    last_name,
                    username,
                    email,
                    password_hash,
                    password_salt,
                    state
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active');",
                params![
                    id.to_string(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.username.as_str(),
                    user.email.as_str(),
                    password_hash,
                    password_salt,
                ],
            )
            .map_err(|err| {
                map_unique_violation(err, || duplicate_account(&user.username, &user.email))
            })?;

        self.load(id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::User, id))
    }

    fn load(&self, id: UserId, visibility: Visibility) -> RepoResult<Option<User>> {
        self.query_one(
            &format!(
                "{USER_SELECT}
                 WHERE id = ?1
                   AND {};",
                visibility.sql_predicate("state")
            ),
            &id.to_string(),
        )
    }

    fn load_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.query_one(
            &format!(
                "{USER_SELECT}
                 WHERE email = ?1
                   AND {};",
                Visibility::Default.sql_predicate("state")
            ),
            email,
        )
    }

    fn update(&self, user: &User) -> RepoResult<User> {
        let changed = self
            .conn
            .execute(
                "UPDATE users
                 SET first_name = ?2,
                     last_name = ?3,
                     username = ?4,
                     email = ?5,
                     password_hash = ?6,
                     password_salt = ?7
                 WHERE id = ?1
                   AND state <> 'deleted';",
                params![
                    user.id.to_string(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.username.as_str(),
                    user.email.as_str(),
                    user.password_hash.as_str(),
                    user.password_salt.as_str(),
                ],
            )
            .map_err(|err| {
                map_unique_violation(err, || duplicate_account(&user.username, &user.email))
            })?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::User, user.id));
        }

        self.load(user.id, Visibility::IncludeHidden)?
            .ok_or_else(|| RepoError::not_found(EntityKind::User, user.id))
    }

    fn mark_deleted(&self, id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE users SET state = 'deleted' WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn duplicate_account(username: &str, email: &str) -> String {
    format!("user `{username}` or email `{email}` is already registered")
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: uuid_column(row, "id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        password_salt: row.get("password_salt")?,
        state: state_column(row, "users")?,
    })
}
