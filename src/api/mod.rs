/// API routes and handlers
pub mod account;
pub mod middleware;
pub mod oauth;
pub mod reset;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(account::routes())
        .merge(oauth::routes())
        .merge(reset::routes())
}
