//! Liveness and configuration report, mounted at the root (not under `/api/v1`).

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when the form store is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub form_store: StoreHealth,
    pub external_checks: ExternalCheckReport,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub reachable: bool,
}

/// How `validation_url` and `evaluation_url` rules are being served.
#[derive(Debug, Serialize)]
pub struct ExternalCheckReport {
    /// `live` or `offline`. Offline passes every external rule.
    pub mode: &'static str,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let reachable = match dynforms_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Form store health check failed");
            false
        }
    };

    let checks = &state.config.external_checks;
    Json(HealthReport {
        status: if reachable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        form_store: StoreHealth { reachable },
        external_checks: ExternalCheckReport {
            mode: checks.mode.as_str(),
            timeout_secs: checks.timeout.as_secs(),
            connect_timeout_secs: checks.connect_timeout.as_secs(),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
