//! Handlers for the `/forms` resource.
//!
//! Read-only form detail and submission evaluation. Schemas are built from
//! the store on every request.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dynforms_core::field_type::FieldType;
use dynforms_core::types::DbId;
use dynforms_core::validation::schema::FormSchema;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::SubmissionPayload;
use crate::response::{DataResponse, SubmissionResponse};
use crate::state::AppState;

/// A form as shown to clients, with nested forms expanded inline.
#[derive(Debug, Serialize)]
pub struct FormDetail {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub fields: Vec<FieldDetail>,
}

#[derive(Debug, Serialize)]
pub struct FieldDetail {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub hidden: bool,
    pub options: Vec<String>,
    /// Rule strings as stored.
    pub validation: Vec<String>,
    pub style: Option<String>,
    pub index: i32,
    pub nested_form: Option<FormDetail>,
}

impl From<&FormSchema> for FormDetail {
    fn from(schema: &FormSchema) -> Self {
        let fields = schema
            .fields
            .values()
            .map(|spec| {
                let binding = &spec.binding;
                FieldDetail {
                    name: binding.name.clone(),
                    label: binding.label.clone(),
                    field_type: binding.field_type,
                    required: binding.required,
                    hidden: binding.hidden,
                    options: binding.options.clone(),
                    validation: binding.rule_strings.clone(),
                    style: binding.style.clone(),
                    index: binding.order_index,
                    nested_form: spec.nested.as_deref().map(FormDetail::from),
                }
            })
            .collect();

        Self {
            id: schema.id,
            name: schema.name.clone(),
            slug: schema.slug.clone(),
            fields,
        }
    }
}

/// GET /api/v1/forms/{slug}
///
/// Return the form definition. 404 for unknown or archived slugs.
pub async fn get_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<FormDetail>>> {
    let schema = state.schemas.build(&slug).await?;
    Ok(Json(DataResponse {
        data: FormDetail::from(schema.as_ref()),
    }))
}

/// POST /api/v1/forms/{slug}/submit
///
/// Coerce and validate a submission. 200 with the cleaned values, or 400
/// with the per-field error report.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    SubmissionPayload(submission): SubmissionPayload,
) -> AppResult<(StatusCode, Json<SubmissionResponse>)> {
    let schema = state.schemas.build(&slug).await?;

    match state.evaluator.evaluate(&schema, &submission).await {
        Ok(data) => {
            tracing::info!(form = %slug, "Form submission accepted");
            Ok((StatusCode::OK, Json(SubmissionResponse::accepted(data))))
        }
        Err(errors) => {
            tracing::info!(form = %slug, fields = errors.len(), "Form submission rejected");
            Ok((
                StatusCode::BAD_REQUEST,
                Json(SubmissionResponse::rejected(errors)),
            ))
        }
    }
}
