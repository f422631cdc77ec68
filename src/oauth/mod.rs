/// External identity bridge
///
/// Links a local account to an OAuth2 identity provider through the
/// authorization-code flow: exchange the code for token material, ask the
/// provider who the user is, find-or-create the local account, and store
/// the token material on the (account, provider) link. Re-linking revokes
/// the previous provider token before overwriting it so provider-side
/// grants do not accumulate across repeated logins.
use crate::{
    config::OAuthConfig,
    db::models::{Provider, ProviderLink},
    directory::AccountDirectory,
    error::{AuthError, AuthResult},
    session::SessionTokenService,
};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

pub struct IdentityBridge {
    db: SqlitePool,
    http: reqwest::Client,
    config: OAuthConfig,
    directory: Arc<AccountDirectory>,
    sessions: Arc<SessionTokenService>,
}

/// The provider's answer to "who is this token for"
#[derive(Debug, serde::Deserialize)]
struct ProviderIdentity {
    email: String,
}

impl IdentityBridge {
    pub fn new(
        db: SqlitePool,
        config: OAuthConfig,
        directory: Arc<AccountDirectory>,
        sessions: Arc<SessionTokenService>,
    ) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            config,
            directory,
            sessions,
        }
    }

    /// The provider-hosted consent URL a caller should send the user to
    pub fn login_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode("identify email"),
        )
    }

    /// Complete an external login from an authorization code.
    ///
    /// Every provider-side failure surfaces as ProviderExchange; the cause
    /// is logged here and never shown to the caller.
    pub async fn complete_login(&self, code: &str) -> AuthResult<(String, DateTime<Utc>)> {
        let material = self.exchange_code(code).await?;

        let access_token = material
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                tracing::error!("Provider token response carried no access_token");
                AuthError::ProviderExchange("Malformed token response".to_string())
            })?
            .to_string();

        let identity = self.fetch_identity(&access_token).await?;

        let account = match self.directory.find_by_email(&identity.email).await {
            Ok(account) => account,
            Err(AuthError::NotFound(_)) => {
                // First external login creates the account, password absent
                self.directory.create_account(&identity.email, None).await?
            }
            Err(e) => return Err(e),
        };

        let material_json = material.to_string();
        if let Some(previous) = self.find_link(account.id, Provider::Discord).await? {
            if let Some(old_material) = previous.access_token_json {
                self.revoke_material(&old_material).await;
            }
        }
        self.upsert_link(account.id, Provider::Discord, &material_json)
            .await?;

        tracing::info!("External login completed for account {}", account.id);
        self.sessions.issue(account.id).await
    }

    /// Exchange an authorization code for the provider's token material
    async fn exchange_code(&self, code: &str) -> AuthResult<serde_json::Value> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Code exchange request failed: {}", e);
                AuthError::ProviderExchange("Code exchange failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("Code exchange rejected with status {}", response.status());
            return Err(AuthError::ProviderExchange("Code exchange failed".to_string()));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Code exchange returned unparseable body: {}", e);
            AuthError::ProviderExchange("Malformed token response".to_string())
        })
    }

    /// Ask the provider's identity endpoint for the user's email
    async fn fetch_identity(&self, access_token: &str) -> AuthResult<ProviderIdentity> {
        let response = self
            .http
            .get(&self.config.identity_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identity fetch failed: {}", e);
                AuthError::ProviderExchange("Identity fetch failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("Identity fetch rejected with status {}", response.status());
            return Err(AuthError::ProviderExchange("Identity fetch failed".to_string()));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Identity endpoint returned unparseable body: {}", e);
            AuthError::ProviderExchange("Malformed identity response".to_string())
        })
    }

    /// Best-effort revocation of previously stored token material with the
    /// provider. Failure is logged and discarded; the overwrite proceeds
    /// regardless.
    async fn revoke_material(&self, material_json: &str) {
        let material: serde_json::Value = match serde_json::from_str(material_json) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Stored token material is not valid JSON, skipping revoke: {}", e);
                return;
            }
        };

        for field in ["access_token", "refresh_token"] {
            let token = match material.get(field).and_then(|v| v.as_str()) {
                Some(token) => token,
                None => continue,
            };

            let params = [
                ("token", token),
                ("token_type_hint", field),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ];

            match self.http.post(&self.config.revoke_url).form(&params).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    tracing::warn!(
                        "Provider declined {} revocation with status {}",
                        field,
                        response.status()
                    );
                }
                Err(e) => {
                    tracing::warn!("Provider {} revocation failed: {}", field, e);
                }
            }
        }
    }

    /// The link for an (account, provider) pair, if any
    pub async fn find_link(
        &self,
        account_id: i64,
        provider: Provider,
    ) -> AuthResult<Option<ProviderLink>> {
        let row = sqlx::query(
            "SELECT id, account_id, provider, access_token_json FROM auth_provider
             WHERE account_id = ?1 AND provider = ?2",
        )
        .bind(account_id)
        .bind(provider.as_str())
        .fetch_optional(&self.db)
        .await
        .map_err(AuthError::Database)?;

        match row {
            Some(row) => Ok(Some(ProviderLink::from_columns(
                row.try_get("id")?,
                row.try_get("account_id")?,
                row.try_get::<String, _>("provider")?.as_str(),
                row.try_get("access_token_json")?,
            )?)),
            None => Ok(None),
        }
    }

    /// Store token material on the (account, provider) link, replacing any
    /// existing material in one statement
    pub async fn upsert_link(
        &self,
        account_id: i64,
        provider: Provider,
        material_json: &str,
    ) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO auth_provider (account_id, provider, access_token_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (account_id, provider)
             DO UPDATE SET access_token_json = excluded.access_token_json",
        )
        .bind(account_id)
        .bind(provider.as_str())
        .bind(material_json)
        .execute(&self.db)
        .await
        .map_err(AuthError::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/finish_external_login".to_string(),
            authorize_url: "https://discord.com/oauth2/authorize".to_string(),
            token_url: "https://discord.com/api/oauth2/token".to_string(),
            revoke_url: "https://discord.com/api/oauth2/token/revoke".to_string(),
            identity_url: "https://discord.com/api/users/@me".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_url_carries_client_and_redirect() {
        let db = sqlx::SqlitePool::connect(":memory:").await.unwrap();
        let directory = Arc::new(AccountDirectory::new(db.clone()));
        let sessions = Arc::new(SessionTokenService::new(db.clone(), directory.clone()));
        let bridge = IdentityBridge::new(db, test_config(), directory, sessions);

        let url = bridge.login_url();
        assert!(url.starts_with("https://discord.com/oauth2/authorize?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Ffinish_external_login"));
        assert!(url.contains("scope=identify%20email"));
    }
}
