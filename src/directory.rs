/// Account directory: lookup, creation, and deletion of accounts
///
/// Owns the durable account records and their password hashes. The token
/// services and the identity bridge reach accounts only through this
/// directory.
use crate::{
    db::models::Account,
    error::{AuthError, AuthResult},
    password,
};
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct AccountDirectory {
    db: SqlitePool,
}

impl AccountDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new account.
    ///
    /// Email comparison is case-sensitive exact match. When no password is
    /// supplied the stored hash is the empty string and the account can
    /// only authenticate via an external identity.
    pub async fn create_account(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> AuthResult<Account> {
        if self.email_exists(email).await? {
            return Err(AuthError::AlreadyExists("Email already registered".to_string()));
        }

        let password_hash = match password {
            Some(plaintext) => password::hash_password(plaintext)?,
            None => String::new(),
        };

        let role = "user";
        let result = sqlx::query(
            "INSERT INTO accounts (email, password_hash, role) VALUES (?1, ?2, ?3)",
        )
        .bind(email)
        .bind(&password_hash)
        .bind(role)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            // The UNIQUE constraint closes the check-then-insert window
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AuthError::AlreadyExists("Email already registered".to_string())
            }
            other => AuthError::Database(other),
        })?;

        let id = result.last_insert_rowid();
        tracing::info!("Created account {} for {}", id, email);

        Account::from_columns(id, email.to_string(), password_hash, role)
    }

    /// Find an account by email (case-sensitive exact match)
    pub async fn find_by_email(&self, email: &str) -> AuthResult<Account> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AuthError::Database)?
        .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))?;

        Account::from_columns(
            row.try_get("id")?,
            row.try_get("email")?,
            row.try_get("password_hash")?,
            row.try_get::<String, _>("role")?.as_str(),
        )
    }

    /// Find an account by id
    pub async fn find_by_id(&self, id: i64) -> AuthResult<Account> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role FROM accounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(AuthError::Database)?
        .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))?;

        Account::from_columns(
            row.try_get("id")?,
            row.try_get("email")?,
            row.try_get("password_hash")?,
            row.try_get::<String, _>("role")?.as_str(),
        )
    }

    /// Delete an account and everything that belongs to it.
    ///
    /// Cascades to session tokens, reset tokens, and provider links so no
    /// credential for the account can outlive it.
    pub async fn delete_account(&self, id: i64) -> AuthResult<()> {
        let mut tx = self.db.begin().await.map_err(AuthError::Database)?;

        sqlx::query("DELETE FROM auth_tokens WHERE account_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE account_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        sqlx::query("DELETE FROM auth_provider WHERE account_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AuthError::Database)?;

        tx.commit().await.map_err(AuthError::Database)?;

        tracing::info!("Deleted account {}", id);
        Ok(())
    }

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(AuthError::Database)?;

        Ok(count > 0)
    }
}
