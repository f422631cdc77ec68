/// Password reset flow
///
/// Issues, validates, and consumes the short-lived one-time tokens that
/// authorize a password change. An account holds at most one live reset
/// token; requesting a new one replaces the old atomically.
use crate::{
    directory::AccountDirectory,
    error::{AuthError, AuthResult},
    password, token,
};
use chrono::{Duration, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

/// Reset tokens are short-lived: hours, not days
const RESET_TOKEN_DURATION_HOURS: i64 = 5;

#[derive(Clone)]
pub struct PasswordResetFlow {
    db: SqlitePool,
    directory: Arc<AccountDirectory>,
}

impl PasswordResetFlow {
    pub fn new(db: SqlitePool, directory: Arc<AccountDirectory>) -> Self {
        Self { db, directory }
    }

    /// Request a reset token for an account.
    ///
    /// Returns the token for hand-off to the mail collaborator; it must
    /// never be echoed back over the requesting channel.
    pub async fn request(&self, email: &str) -> AuthResult<String> {
        let mut tx = self.db.begin().await.map_err(AuthError::Database)?;

        Self::sweep(&mut tx).await?;

        let account = self.directory.find_by_email(email).await?;

        let token = token::generate_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_DURATION_HOURS);

        // Upsert keyed on account_id: replaces any live token in one
        // statement, keeping the at-most-one invariant under interleaving
        sqlx::query(
            "INSERT INTO password_reset_tokens (account_id, token, expires_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (account_id)
             DO UPDATE SET token = excluded.token, expires_at = excluded.expires_at",
        )
        .bind(account.id)
        .bind(&token)
        .bind(expires_at.timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(AuthError::Database)?;

        tx.commit().await.map_err(AuthError::Database)?;

        tracing::info!("Issued password reset token for account {}", account.id);
        Ok(token)
    }

    /// Check that a token exists, has not expired, and belongs to the
    /// account registered under the supplied email
    pub async fn validate(&self, token: &str, email: &str) -> AuthResult<bool> {
        let mut tx = self.db.begin().await.map_err(AuthError::Database)?;

        Self::sweep(&mut tx).await?;
        let owner = Self::owner_email(&mut tx, token).await?;

        tx.commit().await.map_err(AuthError::Database)?;

        match owner {
            Some(owner_email) if owner_email == email => Ok(true),
            Some(_) => {
                tracing::warn!("Reset token presented with a non-matching email");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Consume a token: overwrite the account's password hash and delete
    /// the token, all in one transaction. A failed validation mutates
    /// nothing.
    pub async fn consume(&self, token: &str, email: &str, new_password: &str) -> AuthResult<bool> {
        let mut tx = self.db.begin().await.map_err(AuthError::Database)?;

        Self::sweep(&mut tx).await?;

        let row = sqlx::query(
            "SELECT t.id, t.account_id, a.email
             FROM password_reset_tokens t JOIN accounts a ON a.id = t.account_id
             WHERE t.token = ?1",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AuthError::Database)?;

        let (token_id, account_id) = match row {
            Some(row) => {
                let owner_email: String = row.try_get("email")?;
                if owner_email != email {
                    tracing::warn!("Reset token presented with a non-matching email");
                    return Ok(false);
                }
                (row.try_get::<i64, _>("id")?, row.try_get::<i64, _>("account_id")?)
            }
            None => return Ok(false),
        };

        let new_hash = password::hash_password(new_password)?;

        sqlx::query("UPDATE accounts SET password_hash = ?1 WHERE id = ?2")
            .bind(&new_hash)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE id = ?1")
            .bind(token_id)
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        tx.commit().await.map_err(AuthError::Database)?;

        tracing::info!("Password reset completed for account {}", account_id);
        Ok(true)
    }

    /// Delete all expired reset tokens
    async fn sweep(tx: &mut Transaction<'_, Sqlite>) -> AuthResult<()> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < ?1")
            .bind(Utc::now().timestamp_millis())
            .execute(&mut **tx)
            .await
            .map_err(AuthError::Database)?;

        Ok(())
    }

    /// Email of the account owning a live token, if any
    async fn owner_email(
        tx: &mut Transaction<'_, Sqlite>,
        token: &str,
    ) -> AuthResult<Option<String>> {
        let row = sqlx::query(
            "SELECT a.email
             FROM password_reset_tokens t JOIN accounts a ON a.id = t.account_id
             WHERE t.token = ?1",
        )
        .bind(token)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AuthError::Database)?;

        row.map(|r| r.try_get("email").map_err(AuthError::Database))
            .transpose()
    }
}
