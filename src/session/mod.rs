//! The opaque-session collaborator and its cookie-backed default.
//!
//! A session is only a per-client conversation identifier; it is not a
//! security boundary on its own. The authentication core combines it with a
//! bound user and IP before trusting it.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;

const SESSION_COOKIE_NAME: &str = "varco_session";
const SESSION_TOKEN_BYTES: usize = 32;

/// An opaque per-client conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
}

impl Session {
    #[must_use]
    pub fn new(id: String) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A resolved session, plus the cookie to send when it was just created.
#[derive(Debug)]
pub struct SessionHandle {
    pub session: Session,
    pub set_cookie: Option<HeaderValue>,
}

/// Resolves or creates the session for an inbound request.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_or_create(&self, headers: &HeaderMap) -> SessionHandle;
}

/// Stateless cookie sessions: the id travels only in the cookie.
///
/// Validity of a session comes entirely from the authentication binding, so
/// no server-side session table is needed.
#[derive(Debug, Clone, Default)]
pub struct CookieSessions {
    secure: bool,
}

impl CookieSessions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark issued cookies `Secure`. Only set this when serving over HTTPS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    fn session_cookie(&self, token: &str) -> Option<HeaderValue> {
        let mut cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}

/// Create a new opaque session token. The raw value only ever travels in
/// the cookie.
fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

#[async_trait]
impl SessionProvider for CookieSessions {
    async fn get_or_create(&self, headers: &HeaderMap) -> SessionHandle {
        if let Some(token) = extract_session_token(headers) {
            return SessionHandle {
                session: Session::new(token),
                set_cookie: None,
            };
        }

        let token = generate_session_token();
        let set_cookie = self.session_cookie(&token);
        SessionHandle {
            session: Session::new(token),
            set_cookie,
        }
    }
}
