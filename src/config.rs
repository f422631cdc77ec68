/// Configuration management for Silverdoor
use crate::error::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub email: Option<EmailConfig>,
    pub oauth: Option<OAuthConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Externally reachable base URL, used in reset links and the OAuth
    /// redirect URI
    pub public_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub account_db: PathBuf,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// OAuth2 provider configuration (Discord-shaped authorization-code flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub revoke_url: String,
    pub identity_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AuthResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("SILVERDOOR_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("SILVERDOOR_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| AuthError::Validation("Invalid port number".to_string()))?;

        let public_url = env::var("SILVERDOOR_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));

        let data_directory: PathBuf = env::var("SILVERDOOR_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let account_db = env::var("SILVERDOOR_ACCOUNT_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("accounts.sqlite"));

        let email = if let Ok(smtp_url) = env::var("SILVERDOOR_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("SILVERDOOR_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        // External login is only offered when provider credentials are set
        let oauth = if let Ok(client_id) = env::var("SILVERDOOR_OAUTH_CLIENT_ID") {
            Some(OAuthConfig {
                client_id,
                client_secret: env::var("SILVERDOOR_OAUTH_CLIENT_SECRET").map_err(|_| {
                    AuthError::Validation("OAuth client secret required".to_string())
                })?,
                redirect_uri: env::var("SILVERDOOR_OAUTH_REDIRECT_URI")
                    .unwrap_or_else(|_| format!("{}/finish_external_login", public_url)),
                authorize_url: env::var("SILVERDOOR_OAUTH_AUTHORIZE_URL")
                    .unwrap_or_else(|_| "https://discord.com/oauth2/authorize".to_string()),
                token_url: env::var("SILVERDOOR_OAUTH_TOKEN_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/oauth2/token".to_string()),
                revoke_url: env::var("SILVERDOOR_OAUTH_REVOKE_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/oauth2/token/revoke".to_string()),
                identity_url: env::var("SILVERDOOR_OAUTH_IDENTITY_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/users/@me".to_string()),
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
            },
            storage: StorageConfig {
                data_directory,
                account_db,
            },
            email,
            oauth,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AuthResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AuthError::Validation("Hostname cannot be empty".to_string()));
        }

        if let Some(ref oauth) = self.oauth {
            if oauth.client_id.is_empty() || oauth.client_secret.is_empty() {
                return Err(AuthError::Validation(
                    "OAuth client id and secret cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
