/// External identity login endpoints
use crate::{
    api::account::TokenResponse,
    context::AppContext,
    error::{AuthError, AuthResult},
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build external login routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/oauth/login-url", get(login_url))
        .route("/auth/oauth/complete", post(complete_login))
}

/// Consent URL response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUrlResponse {
    pub url: String,
}

/// Authorization code hand-off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteLoginRequest {
    pub code: String,
}

/// The provider-hosted consent URL
async fn login_url(State(ctx): State<AppContext>) -> AuthResult<Json<LoginUrlResponse>> {
    let bridge = ctx.identity_bridge.as_ref().ok_or_else(|| {
        AuthError::NotFound("External login is not configured".to_string())
    })?;

    Ok(Json(LoginUrlResponse {
        url: bridge.login_url(),
    }))
}

/// Finish an external login from the authorization code
async fn complete_login(
    State(ctx): State<AppContext>,
    Json(req): Json<CompleteLoginRequest>,
) -> AuthResult<Json<TokenResponse>> {
    tracing::info!("complete_login: Route called");

    let bridge = ctx.identity_bridge.as_ref().ok_or_else(|| {
        AuthError::NotFound("External login is not configured".to_string())
    })?;

    let (token, expires_at) = bridge.complete_login(&req.code).await?;

    Ok(Json(TokenResponse { token, expires_at }))
}
