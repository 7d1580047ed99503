//! Route definitions for the `/stats` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::stats;
use crate::state::AppState;

/// Routes mounted at `/stats`.
///
/// ```text
/// GET  /                 -> get_stats
/// POST /saves            -> record_save
/// GET  /saves            -> list_saves (admin)
/// GET  /{operator_id}    -> get_operator_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(stats::get_stats))
        .route("/saves", get(stats::list_saves).post(stats::record_save))
        .route("/{operator_id}", get(stats::get_operator_stats))
}
