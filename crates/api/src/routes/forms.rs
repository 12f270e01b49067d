//! Route definitions for the `/forms` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::forms;
use crate::state::AppState;

/// Routes mounted at `/forms`.
///
/// ```text
/// GET    /{slug}          -> get_form
/// POST   /{slug}/submit   -> submit_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(forms::get_form))
        .route("/{slug}/submit", post(forms::submit_form))
}
