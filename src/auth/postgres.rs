//! Postgres-backed implementation of the authentication store.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::error::StoreError;
use super::models::{AuthenticationBinding, User};
use super::store::AuthenticationStore;

/// Store over a shared [`PgPool`]. Schema lives in `sql/schema.sql`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User::new(
        row.get("id"),
        row.get("username"),
        row.get("password_hash"),
        row.get("recovery_email"),
    )
}

#[async_trait]
impl AuthenticationStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, StoreError> {
        let query = r"
            INSERT INTO users
                (username, recovery_email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(row.get("id")),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateUsername),
            Err(err) => Err(StoreError::Backend(
                anyhow::Error::new(err).context("failed to insert user"),
            )),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let query = "SELECT id, username, password_hash, recovery_email FROM users WHERE username = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by username")?;

        row.map(|row| user_from_row(&row)).ok_or(StoreError::NotFound)
    }

    async fn find_binding(
        &self,
        session_id: &str,
    ) -> Result<(AuthenticationBinding, User), StoreError> {
        let query = r"
            SELECT a.session_id, a.user_id, a.ip_address,
                   u.id, u.username, u.password_hash, u.recovery_email
            FROM authentications a
            JOIN users u ON u.id = a.user_id
            WHERE a.session_id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup session binding")?;

        let row = row.ok_or(StoreError::NotFound)?;
        let binding = AuthenticationBinding::new(
            row.get("session_id"),
            row.get("user_id"),
            row.get("ip_address"),
        );
        Ok((binding, user_from_row(&row)))
    }

    async fn insert_binding(
        &self,
        session_id: &str,
        user_id: i64,
        ip_address: &str,
    ) -> Result<(), StoreError> {
        // One binding per session id: a re-login replaces the previous row.
        let query = r"
            INSERT INTO authentications
                (session_id, user_id, ip_address)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id)
            DO UPDATE SET user_id = EXCLUDED.user_id, ip_address = EXCLUDED.ip_address
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_id)
            .bind(user_id)
            .bind(ip_address)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert session binding")?;
        Ok(())
    }

    async fn delete_binding(&self, session_id: &str) -> Result<(), StoreError> {
        let query = "DELETE FROM authentications WHERE session_id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete session binding")?;
        Ok(())
    }
}
