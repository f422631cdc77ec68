/// Database models for accounts, tokens, and provider links
use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> AuthResult<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(AuthError::Validation(format!("Invalid role: {}", s))),
        }
    }
}

/// External identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Discord,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Discord => "discord",
        }
    }

    pub fn parse(s: &str) -> AuthResult<Self> {
        match s {
            "discord" => Ok(Provider::Discord),
            _ => Err(AuthError::Validation(format!("Invalid provider: {}", s))),
        }
    }
}

/// Account record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    /// Empty string when the account was created via an external identity
    /// and has never set a local password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl Account {
    /// Build an account from its raw row columns
    pub fn from_columns(id: i64, email: String, password_hash: String, role: &str) -> AuthResult<Self> {
        Ok(Self {
            id,
            email,
            password_hash,
            role: Role::parse(role)?,
        })
    }
}

/// Session token record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionToken {
    pub id: i64,
    pub account_id: i64,
    pub token: String,
    /// Epoch milliseconds
    pub expires_at: i64,
}

impl SessionToken {
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }
}

/// Password reset token record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: i64,
    pub account_id: i64,
    pub token: String,
    /// Epoch milliseconds
    pub expires_at: i64,
}

/// External identity link record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderLink {
    pub id: i64,
    pub account_id: i64,
    pub provider: Provider,
    /// Opaque provider token material
    pub access_token_json: Option<String>,
}

impl ProviderLink {
    /// Build a link from its raw row columns
    pub fn from_columns(
        id: i64,
        account_id: i64,
        provider: &str,
        access_token_json: Option<String>,
    ) -> AuthResult<Self> {
        Ok(Self {
            id,
            account_id,
            provider: Provider::parse(provider)?,
            access_token_json,
        })
    }
}
