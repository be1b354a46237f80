//! One-way, salted password hashing with Argon2id.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier, password_hash::SaltString,
    password_hash::rand_core::OsRng,
};

use super::error::HashError;

/// Hashes and verifies passwords with the default Argon2id parameter set.
///
/// Both operations are pure over their inputs; the per-hash salt makes the
/// output self-describing, so no hasher state is needed for verification.
#[derive(Debug, Default, Clone)]
pub struct PasswordHasher;

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Produce a salted PHC-format hash of `plaintext`.
    ///
    /// Fails only on environment-level breakage (entropy, memory); such a
    /// failure is fatal, not retried.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2::PasswordHasher::hash_password(
            &Argon2::default(),
            plaintext.as_bytes(),
            &salt,
        )
        .map_err(|err| HashError::Hashing(err.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// A hash that does not parse is a [`HashError::Format`], reported
    /// distinctly instead of being silently treated as a non-match.
    pub fn verify(&self, stored_hash: &str, plaintext: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|_| HashError::Format)?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(HashError::Hashing(err.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("secret1").unwrap();
        assert!(hasher.verify(&hash, "secret1").unwrap());
        assert!(!hasher.verify(&hash, "secret2").unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = PasswordHasher::new();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_a_format_error() {
        let hasher = PasswordHasher::new();
        let err = hasher.verify("not-a-phc-string", "secret1").unwrap_err();
        assert!(matches!(err, HashError::Format));
    }
}
