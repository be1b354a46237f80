//! Error taxonomy for the authentication core.

use thiserror::Error;

/// Failures from the password-hashing boundary.
///
/// A malformed stored hash is reported as [`HashError::Format`] rather than
/// being treated as a non-match; anything else is an environment-level
/// failure that retrying will not fix.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("malformed password hash")]
    Format,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Failures from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("username already taken")]
    DuplicateUsername,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures from the authentication state machine.
///
/// Unknown user and wrong password collapse into
/// [`AuthError::InvalidCredentials`] so callers cannot enumerate usernames.
/// An existing session presented with the wrong IP is [`AuthError::IpMismatch`],
/// distinct from [`AuthError::UnknownSession`]: the former indicates a token
/// presented from a different network origin.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error("invalid username and password combination")]
    InvalidCredentials,
    #[error("unrecognised session id")]
    UnknownSession,
    #[error("unrecognised ip address")]
    IpMismatch,
    #[error(transparent)]
    Hashing(#[from] HashError),
    #[error("authentication store failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_username_maps_to_auth_variant() {
        let err = AuthError::from(StoreError::DuplicateUsername);
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[test]
    fn backend_errors_stay_opaque() {
        let err = AuthError::from(StoreError::Backend(anyhow::anyhow!("connection refused")));
        assert!(matches!(err, AuthError::Store(StoreError::Backend(_))));
        assert!(err.to_string().contains("authentication store failure"));
    }

    #[test]
    fn credential_errors_share_one_message() {
        // Unknown user and wrong password must be indistinguishable.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid username and password combination"
        );
    }
}
