/// Authentication extractors and utilities
use crate::{
    api::middleware::extract_bearer_token,
    context::AppContext,
    db::models::Account,
    error::AuthError,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

/// Authenticated context - extracts and validates the bearer token from
/// the request. Keeps the raw token so revocation can target it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AuthError::Unauthorized("Missing authorization header".to_string()))?;

        let account = state.sessions.resolve(&token).await.map_err(|e| match e {
            // Swept, revoked, and never-issued tokens all read the same
            AuthError::NotFound(_) => AuthError::InvalidCredentials,
            other => other,
        })?;

        Ok(AuthContext { account, token })
    }
}
