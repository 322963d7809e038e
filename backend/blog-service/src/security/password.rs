/// Argon2id hashing for passwords and one-time codes
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a secret into a PHC string safe for database storage
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Constant-time check of `secret` against a PHC hash
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("Password verification failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_secret("correct horse battery staple", &hash).unwrap());
        assert!(!verify_secret("Correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn test_same_secret_hashes_differently() {
        assert_ne!(hash_secret("123456").unwrap(), hash_secret("123456").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_secret("x", "not-a-hash").is_err());
    }
}
