//! The immutable per-request context handed to controllers.

use axum::http::{HeaderMap, Method};
use secrecy::SecretString;
use std::sync::Arc;

use crate::auth::{AuthError, Authenticator, LoginOutcome, RequestAuthenticator, User};
use crate::session::Session;

/// Shared pipeline services reachable from every request context.
#[derive(Clone)]
pub(super) struct Services {
    pub(super) authenticator: Authenticator,
    pub(super) request_auth: RequestAuthenticator,
}

/// Everything a controller may read about the request it is serving.
///
/// Constructed once per request, after authentication resolution and before
/// routing; controllers receive it by value and cannot mutate it.
#[derive(Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    session: Option<Session>,
    user: Option<User>,
    client_ip: Option<String>,
    services: Arc<Services>,
}

impl RequestContext {
    pub(super) fn new(
        method: Method,
        path: String,
        headers: HeaderMap,
        session: Option<Session>,
        user: Option<User>,
        client_ip: Option<String>,
        services: Arc<Services>,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            session,
            user,
            client_ip,
            services,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The authenticated user, when the session/IP binding checked out.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// The normalized client IP, when the transport supplied one.
    #[must_use]
    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// Direct access for flows the conveniences below do not cover.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.services.authenticator
    }

    /// Verify credentials and bind this request's session to its IP.
    ///
    /// Requires session support and a client IP; without a session context
    /// there is nothing to bind, reported as [`AuthError::UnknownSession`].
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        let (Some(session), Some(client_ip)) = (self.session(), self.client_ip()) else {
            return Err(AuthError::UnknownSession);
        };
        self.services
            .authenticator
            .login(username, password, client_ip, session.id())
            .await
    }

    /// Create a user; see [`Authenticator::create_user`].
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        self.services
            .authenticator
            .create_user(username, email, password)
            .await
    }

    /// Unbind this request's session and drop its cached authentications.
    /// A request without a session context is a no-op.
    pub async fn logout(&self) {
        if let Some(session) = self.session() {
            self.services.request_auth.logout(session.id()).await;
        }
    }
}
