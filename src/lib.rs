//! # Varco (Session and IP Bound Request Authentication)
//!
//! `varco` authenticates HTTP requests by binding a session identifier to a
//! client IP address and a resolved user identity, and dispatches each
//! request to application logic only after that binding is validated or
//! established.
//!
//! ## Authentication Model
//!
//! A successful login creates a **binding**: session id ↔ user id ↔ the
//! client IP observed at login. A request is authenticated only when it
//! presents the same session id from the same IP; presenting a known
//! session from a different address is rejected (and logged) as a possible
//! token replay. Passwords are Argon2id-hashed; plaintext never reaches the
//! store.
//!
//! The IP check is an exact string match on the portless connection address.
//! Behind proxies or NAT the observed address is spoofable or shared, so
//! treat the check as a bar against cookie replay from another network
//! origin, not as a security boundary.
//!
//! ## Request Pipeline
//!
//! Every inbound request flows one direction: session resolution → IP
//! extraction → authentication resolution (cache, then store) → context
//! construction → route match → controller → result execution. Resolved
//! authentications are cached in a small, capacity-bounded LRU shared by
//! all in-flight requests; logout invalidates both the stored binding and
//! the session's cache entries.
//!
//! Controllers never see authentication failures — an unauthenticated
//! request simply carries no user, and access-control decisions stay with
//! the application.

pub mod auth;
pub mod cli;
pub mod pipeline;
pub mod session;
pub mod varco;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
