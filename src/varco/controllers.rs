//! Controllers for the shipped authentication service.

use axum::http::{Method, StatusCode};
use regex::Regex;
use secrecy::SecretString;
use serde_json::json;
use tracing::{debug, error};

use crate::auth::{AuthError, BindingStatus};
use crate::pipeline::{BoxedResult, JsonView, Params, RequestContext, RouteTable, controller};

pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^[a-z0-9][a-z0-9_-]{2,31}$").is_ok_and(|re| re.is_match(username))
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub fn valid_password(password: &str) -> bool {
    (8..=128).contains(&password.len())
}

/// The service's route table: register, login, logout, current user.
#[must_use]
pub fn routes() -> RouteTable {
    let mut table = RouteTable::new();
    table.add("register", "/register", Method::POST, controller(register));
    table.add("login", "/login", Method::POST, controller(login));
    table.add("logout", "/logout", Method::POST, controller(logout));
    table.add("me", "/me", Method::GET, controller(me));
    table
}

fn bad_request(message: &str) -> BoxedResult {
    JsonView::new(json!({ "error": message }))
        .with_status(StatusCode::BAD_REQUEST)
        .boxed()
}

async fn register(ctx: RequestContext, params: Params) -> BoxedResult {
    let Some(username) = params.get("username") else {
        return bad_request("Missing username");
    };
    let Some(email) = params.get("email") else {
        return bad_request("Missing email");
    };
    let Some(password) = params.get("password") else {
        return bad_request("Missing password");
    };

    if !valid_username(username) {
        return bad_request("Invalid username");
    }
    if !valid_email(email) {
        return bad_request("Invalid email");
    }
    if !valid_password(password) {
        return bad_request("Invalid password");
    }

    let password = SecretString::from(password.to_string());
    match ctx.create_user(username, email, &password).await {
        Ok(user) => {
            debug!(username, id = user.id(), "registered user");
            JsonView::new(&user).with_status(StatusCode::CREATED).boxed()
        }
        Err(AuthError::DuplicateUsername) => JsonView::new(json!({
            "error": "Username already taken"
        }))
        .with_status(StatusCode::CONFLICT)
        .boxed(),
        Err(err) => {
            error!(%err, "user registration failed");
            JsonView::new(json!({ "error": "Registration failed" }))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                .boxed()
        }
    }
}

async fn login(ctx: RequestContext, params: Params) -> BoxedResult {
    let Some(username) = params.get("username") else {
        return bad_request("Missing username");
    };
    let Some(password) = params.get("password") else {
        return bad_request("Missing password");
    };

    let password = SecretString::from(password.to_string());
    match ctx.login(username, &password).await {
        Ok(outcome) => {
            if let BindingStatus::Failed(err) = &outcome.binding {
                // Advisory: the credential check passed, the session just
                // will not survive to the next request.
                error!(%err, "session binding not persisted");
            }
            JsonView::new(&outcome.user).boxed()
        }
        Err(AuthError::InvalidCredentials | AuthError::UnknownSession) => {
            debug!(username, "rejected login");
            JsonView::new(json!({ "error": "Unauthorized" }))
                .with_status(StatusCode::UNAUTHORIZED)
                .boxed()
        }
        Err(err) => {
            error!(%err, "login failed");
            JsonView::new(json!({ "error": "Login failed" }))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                .boxed()
        }
    }
}

async fn logout(ctx: RequestContext, _params: Params) -> BoxedResult {
    ctx.logout().await;
    JsonView::new(json!({ "logged_out": true })).boxed()
}

async fn me(ctx: RequestContext, _params: Params) -> BoxedResult {
    match ctx.user() {
        Some(user) => JsonView::new(user).boxed(),
        None => JsonView::new(json!({ "error": "Unauthorized" }))
            .with_status(StatusCode::UNAUTHORIZED)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Router;

    #[test]
    fn valid_username_accepts_basic_names() {
        assert!(valid_username("alice"));
        assert!(valid_username("alice-2_b"));
    }

    #[test]
    fn valid_username_rejects_bad_shapes() {
        assert!(!valid_username("al"));
        assert!(!valid_username("Alice"));
        assert!(!valid_username("-leading"));
        assert!(!valid_username(&"a".repeat(33)));
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_password_bounds_length() {
        assert!(valid_password("secret12"));
        assert!(!valid_password("short"));
        assert!(!valid_password(&"p".repeat(129)));
    }

    #[test]
    fn routes_cover_the_auth_surface() {
        let table = routes();
        assert_eq!(table.len(), 4);
        assert!(table.match_route(&Method::POST, "/login").is_some());
        assert!(table.match_route(&Method::GET, "/me").is_some());
    }
}
