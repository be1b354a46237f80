//! Identity and binding records owned by the authentication store.

use serde::Serialize;

/// Identity record.
///
/// The id is store-assigned and immutable once created; the username is
/// unique and immutable after creation. The password hash is an opaque PHC
/// string and never serializes into responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: i64,
    username: String,
    #[serde(skip_serializing)]
    password_hash: String,
    recovery_email: String,
}

impl User {
    #[must_use]
    pub fn new(id: i64, username: String, password_hash: String, recovery_email: String) -> Self {
        Self {
            id,
            username,
            password_hash,
            recovery_email,
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    #[must_use]
    pub fn recovery_email(&self) -> &str {
        &self.recovery_email
    }
}

/// Ties a session identifier to exactly one user id and the client IP
/// observed when the binding was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationBinding {
    session_id: String,
    user_id: i64,
    ip_address: String,
}

impl AuthenticationBinding {
    #[must_use]
    pub fn new(session_id: String, user_id: i64, ip_address: String) -> Self {
        Self {
            session_id,
            user_id,
            ip_address,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    #[must_use]
    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// A binding is valid only when presented together with the exact IP it
    /// was created with.
    #[must_use]
    pub fn matches_ip(&self, ip_address: &str) -> bool {
        self.ip_address == ip_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            7,
            "alice".to_string(),
            "$argon2id$stub".to_string(),
            "alice@example.com".to_string(),
        )
    }

    #[test]
    fn password_hash_never_serializes() {
        let json = serde_json::to_value(user()).expect("serialize user");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["id"], 7);
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn binding_matches_exact_ip_only() {
        let binding =
            AuthenticationBinding::new("sess-1".to_string(), 7, "10.0.0.1".to_string());
        assert!(binding.matches_ip("10.0.0.1"));
        assert!(!binding.matches_ip("10.0.0.2"));
    }
}
