/// Account registration, login, and session endpoints
use crate::{
    auth::AuthContext,
    context::AppContext,
    db::models::Role,
    error::AuthResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(who_am_i).delete(delete_account))
        .route("/auth/revoke", post(revoke_token))
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account info exposed to callers (never the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Issued session token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Register a new account
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<AccountInfo>)> {
    tracing::info!("register: Route called");

    let account = ctx
        .directory
        .create_account(&req.email, Some(&req.password))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountInfo {
            id: account.id,
            email: account.email,
            role: account.role,
        }),
    ))
}

/// Check credentials and issue a session token
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>> {
    tracing::info!("login: Route called");

    let (token, expires_at) = ctx.sessions.authenticate(&req.email, &req.password).await?;

    Ok(Json(TokenResponse { token, expires_at }))
}

/// Resolve the presented token to its account
async fn who_am_i(auth: AuthContext) -> Json<AccountInfo> {
    Json(AccountInfo {
        id: auth.account.id,
        email: auth.account.email,
        role: auth.account.role,
    })
}

/// Delete the authenticated account and everything it owns.
///
/// Callers owning resources outside this service must remove them before
/// invoking deletion; the core does not know about them.
async fn delete_account(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AuthResult<StatusCode> {
    ctx.directory.delete_account(auth.account.id).await?;
    Ok(StatusCode::OK)
}

/// Revoke the presenting session token
async fn revoke_token(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AuthResult<StatusCode> {
    ctx.sessions.revoke(&auth.token).await?;
    Ok(StatusCode::OK)
}
