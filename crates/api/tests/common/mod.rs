#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use dynforms_api::config::ServerConfig;
use dynforms_api::router::build_app_router;
use dynforms_api::state::AppState;
use dynforms_core::validation::coercion::CoercionSettings;
use dynforms_core::validation::evaluator::SubmissionEvaluator;
use dynforms_core::validation::external::{
    ExternalCheckClient, ExternalCheckConfig, ExternalCheckError, ExternalCheckMode,
};
use dynforms_core::validation::schema::SchemaBuilder;
use dynforms_db::models::field::CreateField;
use dynforms_db::models::field_property::CreateFieldProperty;
use dynforms_db::models::form::{CreateForm, Form};
use dynforms_db::repositories::{FieldPropertyRepo, FieldRepo, FormRepo};
use dynforms_db::store::PgFormStore;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        external_checks: ExternalCheckConfig {
            mode: ExternalCheckMode::Offline,
            timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
        },
        coercion: CoercionSettings::default(),
    }
}

/// External check stand-in: rejects `"BAD"` with a 404, accepts anything else.
pub struct StubCheckClient;

#[async_trait]
impl ExternalCheckClient for StubCheckClient {
    async fn check(&self, _base_url: &str, value: &str) -> Result<(), ExternalCheckError> {
        if value == "BAD" {
            Err(ExternalCheckError::Rejected {
                status: 404,
                reason: "Not Found".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Build the full application router, backed by the given database pool.
///
/// Uses the same router builder as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let store = Arc::new(PgFormStore::new(pool.clone()));
    let evaluator = SubmissionEvaluator::new(Arc::new(StubCheckClient), config.coercion.clone());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        schemas: SchemaBuilder::new(store),
        evaluator: Arc::new(evaluator),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, content_type: &str, body: &str) -> Response {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

const BOUNDARY: &str = "dynforms-test-boundary";

pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

pub async fn create_form(pool: &PgPool, name: &str) -> Form {
    FormRepo::create(
        pool,
        &CreateForm {
            name: name.to_string(),
            slug: None,
            metadata: None,
        },
    )
    .await
    .unwrap()
}

/// Create a field and bind it to `form_id` with the given properties.
pub async fn add_field(
    pool: &PgPool,
    form_id: i64,
    name: &str,
    field_type: &str,
    property: CreateFieldProperty,
) {
    add_field_with_target(pool, form_id, name, field_type, None, property).await;
}

pub async fn add_nested(pool: &PgPool, form_id: i64, name: &str, target_form_id: i64) {
    add_field_with_target(
        pool,
        form_id,
        name,
        "nested",
        Some(target_form_id),
        CreateFieldProperty::default(),
    )
    .await;
}

async fn add_field_with_target(
    pool: &PgPool,
    form_id: i64,
    name: &str,
    field_type: &str,
    nested_form_id: Option<i64>,
    property: CreateFieldProperty,
) {
    let field = FieldRepo::create(
        pool,
        &CreateField {
            name: name.to_string(),
            label: None,
            field_type: field_type.to_string(),
            nested_form_id,
        },
    )
    .await
    .unwrap();
    FieldPropertyRepo::create(
        pool,
        &CreateFieldProperty {
            form_id,
            field_id: field.id,
            ..property
        },
    )
    .await
    .unwrap();
}

pub fn required() -> CreateFieldProperty {
    CreateFieldProperty {
        required: Some(true),
        ..Default::default()
    }
}

pub fn rules(rules: &[&str]) -> Vec<String> {
    rules.iter().map(|r| r.to_string()).collect()
}
