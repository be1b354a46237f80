//! Credential verification and session/IP binding orchestration.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::error::{AuthError, StoreError};
use super::models::{AuthenticationBinding, User};
use super::password::PasswordHasher;
use super::store::AuthenticationStore;

/// Whether the session binding survived a successful login.
///
/// Binding persistence is layered on top of the credential check: a failed
/// insert does not invalidate the authenticated result, but callers see the
/// failure here and may escalate.
#[derive(Debug)]
pub enum BindingStatus {
    Established,
    Failed(StoreError),
}

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub binding: BindingStatus,
}

/// Stateless orchestrator over the store: one binding per session id,
/// Unbound → Bound(user, ip) and back via logout.
///
/// Holds no state of its own, so one instance is safely shared across all
/// concurrent requests without locking.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn AuthenticationStore>,
    hasher: PasswordHasher,
}

impl Authenticator {
    #[must_use]
    pub fn new(store: Arc<dyn AuthenticationStore>) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
        }
    }

    /// Create a user. The plaintext is hashed before any store call and is
    /// never persisted.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        let password_hash = self.hasher.hash(password.expose_secret())?;
        let id = self
            .store
            .create_user(username, email, &password_hash)
            .await?;

        debug!(username, id, "created user");

        Ok(User::new(
            id,
            username.to_string(),
            password_hash,
            email.to_string(),
        ))
    }

    /// Verify credentials and establish a session binding.
    ///
    /// A missing user and a wrong password both come back as
    /// [`AuthError::InvalidCredentials`]; store connectivity failures and
    /// hash-format breakage are surfaced as themselves.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        ip_address: &str,
        session_id: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let user = match self.store.find_user_by_username(username).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                debug!(username, "login for unknown username");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(AuthError::Store(err)),
        };

        if !self
            .hasher
            .verify(user.password_hash(), password.expose_secret())?
        {
            debug!(username, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let binding = match self.resolve_authentication(session_id, ip_address).await {
            Ok(_) => BindingStatus::Established,
            Err(AuthError::UnknownSession | AuthError::IpMismatch) => {
                match self
                    .store
                    .insert_binding(session_id, user.id(), ip_address)
                    .await
                {
                    Ok(()) => BindingStatus::Established,
                    Err(err) => {
                        warn!(session_id, %err, "login succeeded but binding insert failed");
                        BindingStatus::Failed(err)
                    }
                }
            }
            Err(AuthError::Store(err)) => {
                warn!(session_id, %err, "login succeeded but binding lookup failed");
                BindingStatus::Failed(err)
            }
            Err(err) => return Err(err),
        };

        Ok(LoginOutcome { user, binding })
    }

    /// Delete any binding for the session id. Idempotent and never fails
    /// observably; store errors are logged and swallowed.
    pub async fn logout(&self, session_id: &str) {
        if let Err(err) = self.store.delete_binding(session_id).await {
            error!(session_id, %err, "failed to delete session binding");
        }
    }

    /// Validate a (session id, IP) pair against the stored binding.
    pub async fn resolve_authentication(
        &self,
        session_id: &str,
        ip_address: &str,
    ) -> Result<(AuthenticationBinding, User), AuthError> {
        let (binding, user) = match self.store.find_binding(session_id).await {
            Ok(found) => found,
            Err(StoreError::NotFound) => return Err(AuthError::UnknownSession),
            Err(err) => return Err(AuthError::Store(err)),
        };

        if !binding.matches_ip(ip_address) {
            return Err(AuthError::IpMismatch);
        }

        Ok((binding, user))
    }
}
