pub mod auth;
pub mod health;
pub mod stats;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                 login (public)
///
/// /stats                      statistics visible to the caller
/// /stats/saves                record a save (POST), list saves (GET, admin only)
/// /stats/{operator_id}        statistics of one operator (self or admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/stats", stats::router())
}
