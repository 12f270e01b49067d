//! Submission body extractor.
//!
//! Accepts either a JSON object or `multipart/form-data`. In multipart
//! bodies, text parts become values (a repeated name becomes a list, a
//! dotted name such as `applicant.first_name` builds nested objects) and
//! file parts become uploaded files keyed by their full dotted name.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use dynforms_core::validation::value::{Submission, UploadedFile};
use serde_json::{Map, Value};

use crate::error::AppError;

/// A parsed submission body.
#[derive(Debug)]
pub struct SubmissionPayload(pub Submission);

impl<S> FromRequest<S> for SubmissionPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return read_multipart(multipart).await.map(SubmissionPayload);
        }

        let Json(data) = Json::<Map<String, Value>>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(SubmissionPayload(Submission::from_data(data)))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            submission.files.insert(
                name,
                UploadedFile {
                    filename,
                    content_type,
                    size: bytes.len(),
                },
            );
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            insert_path(&mut submission.data, &name, text)?;
        }
    }

    Ok(submission)
}

/// Insert `value` at a dotted `path`, turning repeated leaves into lists.
fn insert_path(data: &mut Map<String, Value>, path: &str, value: String) -> Result<(), AppError> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    match rest {
        Some(rest) => {
            let entry = data
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(inner) => insert_path(inner, rest, value),
                _ => Err(AppError::BadRequest(format!(
                    "part '{path}' conflicts with a value already sent for '{head}'"
                ))),
            }
        }
        None => {
            if !data.contains_key(head) {
                data.insert(head.to_string(), Value::String(value));
                return Ok(());
            }
            match &mut data[head] {
                Value::Array(items) => items.push(Value::String(value)),
                Value::Object(_) => {
                    return Err(AppError::BadRequest(format!(
                        "part '{path}' conflicts with nested parts under the same name"
                    )))
                }
                other => {
                    let first = other.take();
                    *other = Value::Array(vec![first, Value::String(value)]);
                }
            }
            Ok(())
        }
    }
}
