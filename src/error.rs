/// Unified error types for Silverdoor
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the credential service
#[derive(Error, Debug)]
pub enum AuthError {
    /// Database errors (also covers an unreachable store)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email, token, or account absent. Expired tokens surface as this
    /// after the sweep has removed them.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate registration
    #[error("Conflict: {0}")]
    AlreadyExists(String),

    /// Password mismatch or unknown email; indistinguishable to callers
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Reset token presented with a non-matching email
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// OAuth2 code exchange or identity fetch failed
    #[error("Provider exchange failed: {0}")]
    ProviderExchange(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mail delivery errors
    #[error("Mail error: {0}")]
    Mail(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "InvalidCredentials",
                self.to_string(),
            ),
            AuthError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                self.to_string(),
            ),
            AuthError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            AuthError::AlreadyExists(_) => (
                StatusCode::CONFLICT,
                "AlreadyExists",
                self.to_string(),
            ),
            AuthError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            AuthError::ProviderExchange(_) => (
                // The cause is logged at the bridge; callers only learn
                // that the external login failed.
                StatusCode::BAD_GATEWAY,
                "ProviderLoginFailed",
                "External login failed".to_string(),
            ),
            AuthError::Database(_)
            | AuthError::Mail(_)
            | AuthError::Internal(_)
            | AuthError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for credential operations
pub type AuthResult<T> = Result<T, AuthError>;
