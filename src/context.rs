/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    db,
    directory::AccountDirectory,
    error::AuthResult,
    mailer::Mailer,
    oauth::IdentityBridge,
    reset::PasswordResetFlow,
    session::SessionTokenService,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services.
///
/// The pool is constructed here exactly once and injected into each
/// service; there is no process-wide singleton to open lazily, so no
/// operation can run against an unopened store.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub directory: Arc<AccountDirectory>,
    pub sessions: Arc<SessionTokenService>,
    pub resets: Arc<PasswordResetFlow>,
    pub identity_bridge: Option<Arc<IdentityBridge>>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AuthResult<Self> {
        config.validate()?;

        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        }

        let pool = db::create_pool(&config.storage.account_db, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let directory = Arc::new(AccountDirectory::new(pool.clone()));
        let sessions = Arc::new(SessionTokenService::new(pool.clone(), directory.clone()));
        let resets = Arc::new(PasswordResetFlow::new(pool.clone(), directory.clone()));

        // External login is only wired up when provider credentials exist
        let identity_bridge = match config.oauth.clone() {
            Some(oauth_config) => Some(Arc::new(IdentityBridge::new(
                pool.clone(),
                oauth_config,
                directory.clone(),
                sessions.clone(),
            ))),
            None => {
                tracing::info!("OAuth provider not configured - external login disabled");
                None
            }
        };

        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            directory,
            sessions,
            resets,
            identity_bridge,
            mailer,
        })
    }

    /// Externally reachable base URL
    pub fn public_url(&self) -> &str {
        &self.config.service.public_url
    }
}
