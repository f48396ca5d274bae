//! User account use cases.
//!
//! # Invariants
//! - Passwords are only ever persisted as Argon2id hashes.
//! - Log lines carry user ids only, never names, emails or passwords.

use super::password::{hash_password, verify_password};
use super::{found, require_text, ServiceDeps, ServiceError, ServiceResult};
use crate::db::write_transaction;
use crate::model::lifecycle::Visibility;
use crate::model::user::{NewUser, User, UserPatch};
use crate::model::{EntityKind, UserId};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::info;

/// User service over a migrated connection.
pub struct UserService<'a> {
    deps: ServiceDeps<'a>,
}

impl<'a> UserService<'a> {
    /// Creates a service after checking the connection schema.
    pub fn try_new(deps: ServiceDeps<'a>) -> ServiceResult<Self> {
        SqliteUserRepository::try_new(deps.conn)?;
        Ok(Self { deps })
    }

    /// Registers a new account. Duplicate username or email is a `Conflict`.
    pub fn register(&self, user: &NewUser, password: &str) -> ServiceResult<User> {
        validate_account(&user.first_name, &user.last_name, &user.username, &user.email)?;
        let material = hash_password(password)?;

        let tx = write_transaction(self.deps.conn)?;
        let created =
            SqliteUserRepository::new(&tx).insert(user, &material.hash, &material.salt)?;
        tx.commit()?;

        info!(
            "event=user_register module=service status=ok user_id={}",
            created.id
        );
        Ok(created)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        let repo = SqliteUserRepository::new(self.deps.conn);
        found(repo.load(id, Visibility::Default)?, EntityKind::User, id)
    }

    pub fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let repo = SqliteUserRepository::new(self.deps.conn);
        Ok(repo.load_by_email(email)?)
    }

    /// Applies a partial update; a new password is re-hashed with a new salt.
    pub fn update_user(&self, id: UserId, patch: &UserPatch) -> ServiceResult<User> {
        let material = patch.password.as_deref().map(hash_password).transpose()?;

        let tx = write_transaction(self.deps.conn)?;
        let repo = SqliteUserRepository::new(&tx);
        let mut user = found(repo.load(id, Visibility::Live)?, EntityKind::User, id)?;
        if let Some(first_name) = &patch.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(username) = &patch.username {
            user.username = username.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(material) = material {
            user.password_hash = material.hash;
            user.password_salt = material.salt;
        }
        validate_account(&user.first_name, &user.last_name, &user.username, &user.email)?;
        let updated = repo.update(&user)?;
        tx.commit()?;

        info!(
            "event=user_update module=service status=ok user_id={} password_changed={}",
            updated.id,
            patch.password.is_some()
        );
        Ok(updated)
    }

    /// Soft-deletes an account. Unknown ids are a no-op.
    pub fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        let tx = write_transaction(self.deps.conn)?;
        let deleted = SqliteUserRepository::new(&tx).mark_deleted(id)?;
        tx.commit()?;

        info!(
            "event=user_delete module=service status=ok user_id={} existed={}",
            id, deleted
        );
        Ok(())
    }

    /// Returns the visible user owning `email` when `password` matches.
    pub fn verify_credentials(&self, email: &str, password: &str) -> ServiceResult<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash)? {
            return Ok(Some(user));
        }
        info!(
            "event=user_verify module=service status=rejected user_id={}",
            user.id
        );
        Ok(None)
    }
}

fn validate_account(
    first_name: &str,
    last_name: &str,
    username: &str,
    email: &str,
) -> ServiceResult<()> {
    require_text("first name", first_name)?;
    require_text("last name", last_name)?;
    require_text("username", username)?;
    require_text("email", email)?;
    if !email.contains('@') {
        return Err(ServiceError::validation(format!(
            "email `{email}` is not an address"
        )));
    }
    Ok(())
}
