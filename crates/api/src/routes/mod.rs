pub mod forms;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /forms/{slug}           form detail (GET)
/// /forms/{slug}/submit    evaluate a submission (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/forms", forms::router())
}
