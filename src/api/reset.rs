/// Password reset endpoints
use crate::{context::AppContext, error::{AuthError, AuthResult}};
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build password reset routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/password-reset/request", post(request_reset))
        .route("/auth/password-reset/validate", post(validate_reset))
        .route("/auth/password-reset/confirm", post(confirm_reset))
}

/// Reset request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

/// Reset credential check body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResetRequest {
    pub token: String,
    pub email: String,
}

/// Reset confirmation body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResetRequest {
    pub token: String,
    pub email: String,
    pub new_password: String,
}

/// Issue a reset token and hand it to the mail collaborator.
///
/// The token travels only in the email; this response never carries it.
/// A mail failure surfaces as an error, but the persisted token stays
/// valid until its natural expiration, so a retry can succeed.
async fn request_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<RequestResetRequest>,
) -> AuthResult<StatusCode> {
    tracing::info!("request_reset: Route called");

    let token = ctx.resets.request(&req.email).await?;

    ctx.mailer
        .send_password_reset(&req.email, &token, ctx.public_url())
        .await?;

    Ok(StatusCode::OK)
}

/// Check a reset token/email pair without consuming it
async fn validate_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<ValidateResetRequest>,
) -> AuthResult<StatusCode> {
    tracing::info!("validate_reset: Route called");

    if !ctx.resets.validate(&req.token, &req.email).await? {
        return Err(AuthError::Unauthorized(
            "Invalid reset credentials".to_string(),
        ));
    }

    Ok(StatusCode::OK)
}

/// Consume a reset token and set the new password
async fn confirm_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<ConfirmResetRequest>,
) -> AuthResult<StatusCode> {
    tracing::info!("confirm_reset: Route called");

    if !ctx
        .resets
        .consume(&req.token, &req.email, &req.new_password)
        .await?
    {
        return Err(AuthError::Unauthorized(
            "Invalid reset credentials".to_string(),
        ));
    }

    Ok(StatusCode::OK)
}
