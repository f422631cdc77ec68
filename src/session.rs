/// Session token service
///
/// Issues and validates the opaque bearer tokens that prove a prior
/// successful authentication. Expiration is enforced by a sweep-on-read:
/// every lookup first deletes tokens whose expiration is in the past, in
/// the same transaction as the lookup itself.
use crate::{
    db::models::Account,
    directory::AccountDirectory,
    error::{AuthError, AuthResult},
    password, token,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Fixed session lifetime; not configurable per call
const SESSION_TOKEN_DURATION_DAYS: i64 = 300;

#[derive(Clone)]
pub struct SessionTokenService {
    db: SqlitePool,
    directory: Arc<AccountDirectory>,
}

impl SessionTokenService {
    pub fn new(db: SqlitePool, directory: Arc<AccountDirectory>) -> Self {
        Self { db, directory }
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown email and wrong password fail identically; the difference is
    /// logged, never surfaced.
    pub async fn authenticate(
        &self,
        email: &str,
        plaintext: &str,
    ) -> AuthResult<(String, DateTime<Utc>)> {
        let account = match self.directory.find_by_email(email).await {
            Ok(account) => account,
            Err(AuthError::NotFound(_)) => {
                tracing::warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !password::verify_password(plaintext, &account.password_hash) {
            tracing::warn!("Password mismatch for account {}", account.id);
            return Err(AuthError::InvalidCredentials);
        }

        self.issue(account.id).await
    }

    /// Issue a fresh token for an account, expiring in 300 days
    pub async fn issue(&self, account_id: i64) -> AuthResult<(String, DateTime<Utc>)> {
        let token = token::generate_token();
        let expires_at = Utc::now() + Duration::days(SESSION_TOKEN_DURATION_DAYS);

        sqlx::query(
            "INSERT INTO auth_tokens (account_id, token, expires_at) VALUES (?1, ?2, ?3)",
        )
        .bind(account_id)
        .bind(&token)
        .bind(expires_at.timestamp_millis())
        .execute(&self.db)
        .await
        .map_err(AuthError::Database)?;

        tracing::info!("Issued session token for account {}", account_id);
        Ok((token, expires_at))
    }

    /// Resolve a token to its owning account.
    ///
    /// Sweeps expired tokens first; a swept, revoked, or never-issued token
    /// fails the same way.
    pub async fn resolve(&self, token: &str) -> AuthResult<Account> {
        let mut tx = self.db.begin().await.map_err(AuthError::Database)?;

        sqlx::query("DELETE FROM auth_tokens WHERE expires_at < ?1")
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        let account_row = sqlx::query(
            "SELECT a.id, a.email, a.password_hash, a.role
             FROM auth_tokens t JOIN accounts a ON a.id = t.account_id
             WHERE t.token = ?1",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AuthError::Database)?;

        tx.commit().await.map_err(AuthError::Database)?;

        let row = account_row
            .ok_or_else(|| AuthError::NotFound("Invalid session token".to_string()))?;

        Account::from_columns(
            row.try_get("id")?,
            row.try_get("email")?,
            row.try_get("password_hash")?,
            row.try_get::<String, _>("role")?.as_str(),
        )
    }

    /// Revoke a token. Revoking a token that does not exist is a no-op.
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await
            .map_err(AuthError::Database)?;

        Ok(())
    }
}
