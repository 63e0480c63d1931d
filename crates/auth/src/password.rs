//! Password hashing and password-reset tokens.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// Hash a password into a PHC string (argon2id, random salt).
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// `false` for a wrong password and for a malformed stored hash.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok()
}

/// A fresh reset token as handed to the user (32 hex chars).
pub fn generate_reset_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// SHA-256 hex digest; only this form of a reset token is stored.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("pass1234").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pass1234", &hash));
        assert!(!verify_password("pass12345", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("pass1234").unwrap();
        let second = hash_password("pass1234").unwrap();
        assert_ne!(first, second);

        let salt = |hash: &str| PasswordHash::new(hash).unwrap().salt.unwrap().as_str().to_string();
        assert_ne!(salt(&first), salt(&second));
        assert!(salt(&first).len() >= 16);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("pass1234", "plain-text"));
    }

    #[test]
    fn reset_token_hash_is_sha256_hex() {
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let token = generate_reset_token();
        assert_eq!(token.len(), 32);
        assert_ne!(hash_reset_token(&token), token);
    }
}
