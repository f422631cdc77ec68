/// Silverdoor - multi-tenant account and credential service
///
/// Issues, validates, and revokes proof-of-identity credentials:
/// password login, opaque bearer session tokens, one-time password-reset
/// tokens, and external OAuth2 identity links.

use silverdoor::{config::ServerConfig, context::AppContext, error::AuthResult, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AuthResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "silverdoor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
