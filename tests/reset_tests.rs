/// Integration tests for the password reset flow
use chrono::{Duration, Utc};
use silverdoor::{
    db::{self, models::PasswordResetToken, DatabaseOptions},
    directory::AccountDirectory,
    error::AuthError,
    reset::PasswordResetFlow,
    session::SessionTokenService,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

struct TestServices {
    _dir: TempDir,
    pool: SqlitePool,
    directory: Arc<AccountDirectory>,
    sessions: Arc<SessionTokenService>,
    resets: Arc<PasswordResetFlow>,
}

async fn setup() -> TestServices {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::create_pool(&dir.path().join("accounts.sqlite"), DatabaseOptions::default())
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();

    let directory = Arc::new(AccountDirectory::new(pool.clone()));
    let sessions = Arc::new(SessionTokenService::new(pool.clone(), directory.clone()));
    let resets = Arc::new(PasswordResetFlow::new(pool.clone(), directory.clone()));

    TestServices {
        _dir: dir,
        pool,
        directory,
        sessions,
        resets,
    }
}

async fn reset_row(pool: &SqlitePool, account_id: i64) -> Option<PasswordResetToken> {
    sqlx::query_as(
        "SELECT id, account_id, token, expires_at FROM password_reset_tokens
         WHERE account_id = ?1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await
    .unwrap()
}

async fn stored_hash(pool: &SqlitePool, account_id: i64) -> String {
    sqlx::query_scalar("SELECT password_hash FROM accounts WHERE id = ?1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_request_for_unknown_email_fails() {
    let services = setup().await;

    let result = services.resets.request("nobody@x.com").await;
    assert!(matches!(result, Err(AuthError::NotFound(_))));
}

#[tokio::test]
async fn test_second_request_replaces_first_token() {
    let services = setup().await;

    let account = services
        .directory
        .create_account("a@x.com", Some("pw1"))
        .await
        .unwrap();

    let first = services.resets.request("a@x.com").await.unwrap();
    let second = services.resets.request("a@x.com").await.unwrap();
    assert_ne!(first, second);

    // At most one live token per account
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens WHERE account_id = ?1")
            .bind(account.id)
            .fetch_one(&services.pool)
            .await
            .unwrap();
    assert_eq!(count, 1);

    assert!(!services.resets.validate(&first, "a@x.com").await.unwrap());
    assert!(services.resets.validate(&second, "a@x.com").await.unwrap());
}

#[tokio::test]
async fn test_validate_requires_exact_email_match() {
    let services = setup().await;

    services
        .directory
        .create_account("a@x.com", Some("pw1"))
        .await
        .unwrap();
    services
        .directory
        .create_account("b@x.com", Some("pw2"))
        .await
        .unwrap();

    let token = services.resets.request("a@x.com").await.unwrap();

    // Replay against another identity claim fails
    assert!(!services.resets.validate(&token, "b@x.com").await.unwrap());
    assert!(!services.resets.validate(&token, "A@X.COM").await.unwrap());
    assert!(services.resets.validate(&token, "a@x.com").await.unwrap());

    // Validation does not consume
    assert!(services.resets.validate(&token, "a@x.com").await.unwrap());
}

#[tokio::test]
async fn test_consume_with_mismatched_email_mutates_nothing() {
    let services = setup().await;

    let account = services
        .directory
        .create_account("a@x.com", Some("pw1"))
        .await
        .unwrap();
    let hash_before = stored_hash(&services.pool, account.id).await;

    let token = services.resets.request("a@x.com").await.unwrap();

    let consumed = services
        .resets
        .consume(&token, "b@x.com", "pw2")
        .await
        .unwrap();
    assert!(!consumed);

    // Hash unchanged, token still live
    assert_eq!(stored_hash(&services.pool, account.id).await, hash_before);
    assert!(reset_row(&services.pool, account.id).await.is_some());
    assert!(services.sessions.authenticate("a@x.com", "pw1").await.is_ok());
}

#[tokio::test]
async fn test_reset_end_to_end() {
    let services = setup().await;

    let account = services
        .directory
        .create_account("a@x.com", Some("pw1"))
        .await
        .unwrap();

    let token = services.resets.request("a@x.com").await.unwrap();
    assert!(services.resets.validate(&token, "a@x.com").await.unwrap());

    let consumed = services
        .resets
        .consume(&token, "a@x.com", "pw2")
        .await
        .unwrap();
    assert!(consumed);

    // One-time use
    let again = services
        .resets
        .consume(&token, "a@x.com", "pw3")
        .await
        .unwrap();
    assert!(!again);
    assert!(reset_row(&services.pool, account.id).await.is_none());

    // Old password dead, new password live
    assert!(matches!(
        services.sessions.authenticate("a@x.com", "pw1").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(services.sessions.authenticate("a@x.com", "pw2").await.is_ok());
}

#[tokio::test]
async fn test_expired_reset_token_is_swept() {
    let services = setup().await;

    let account = services
        .directory
        .create_account("a@x.com", Some("pw1"))
        .await
        .unwrap();

    let token = services.resets.request("a@x.com").await.unwrap();

    let past = (Utc::now() - Duration::minutes(1)).timestamp_millis();
    sqlx::query("UPDATE password_reset_tokens SET expires_at = ?1 WHERE account_id = ?2")
        .bind(past)
        .bind(account.id)
        .execute(&services.pool)
        .await
        .unwrap();

    assert!(!services.resets.validate(&token, "a@x.com").await.unwrap());
    assert!(reset_row(&services.pool, account.id).await.is_none());

    // A consumed attempt against the swept token changes nothing
    let consumed = services
        .resets
        .consume(&token, "a@x.com", "pw2")
        .await
        .unwrap();
    assert!(!consumed);
    assert!(services.sessions.authenticate("a@x.com", "pw1").await.is_ok());
}

#[tokio::test]
async fn test_reset_token_shape_and_horizon() {
    let services = setup().await;

    let account = services
        .directory
        .create_account("a@x.com", Some("pw1"))
        .await
        .unwrap();

    let token = services.resets.request("a@x.com").await.unwrap();
    assert_eq!(token.len(), 60);

    let row = reset_row(&services.pool, account.id).await.unwrap();
    assert_eq!(row.token, token);

    // Short-lived: five hours out, give or take test runtime
    let horizon = (Utc::now() + Duration::hours(5)).timestamp_millis();
    assert!((horizon - row.expires_at).abs() < 60_000);
}
