//! Argon2id password hashing for user accounts.

use super::error::{ServiceError, ServiceResult};
use crate::repo::RepoError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Derived password material: a PHC string and the salt it embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PasswordMaterial {
    pub hash: String,
    pub salt: String,
}

/// Hashes `password` with a fresh random salt and default Argon2id parameters.
pub(crate) fn hash_password(password: &str) -> ServiceResult<PasswordMaterial> {
    if password.is_empty() {
        return Err(ServiceError::validation("password cannot be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ServiceError::validation(format!("failed to hash password: {err}")))?;
    Ok(PasswordMaterial {
        hash: hash.to_string(),
        salt: salt.as_str().to_string(),
    })
}

/// Checks `password` against a stored PHC string.
pub(crate) fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|err| {
        ServiceError::Storage(RepoError::InvalidData(format!(
            "invalid password hash: {err}"
        )))
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_verifies_only_the_original_password() {
        let material = hash_password("correct horse").expect("hash");

        assert!(material.hash.starts_with("$argon2id$"));
        assert!(material.hash.contains(&material.salt));
        assert!(verify_password("correct horse", &material.hash).expect("verify"));
        assert!(!verify_password("wrong horse", &material.hash).expect("verify"));
    }

    #[test]
    fn salts_are_fresh_per_hash() {
        let first = hash_password("secret").expect("hash");
        let second = hash_password("secret").expect("hash");
        assert_ne!(first.salt, second.salt);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("secret", "not-a-phc-string").is_err());
    }
}
