use std::sync::Arc;

use dynforms_core::validation::evaluator::SubmissionEvaluator;
use dynforms_core::validation::schema::SchemaBuilder;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used for health reporting.
    pub pool: dynforms_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Builds form schemas from the form store on each request.
    pub schemas: SchemaBuilder,
    /// Evaluates submissions against built schemas.
    pub evaluator: Arc<SubmissionEvaluator>,
}
