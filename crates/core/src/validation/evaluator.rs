//! Submission evaluator.
//!
//! Walks a [`FormSchema`] in field order: skips hidden fields, reports
//! missing required ones, coerces, then runs every validator and collects
//! all of their messages. Nested forms are evaluated recursively and their
//! failures reported as a sub-map under the nested field's name.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde_json::{Map, Value};

use super::coercion::{CoercionSettings, RawInput};
use super::error::CoercionError;
use super::external::ExternalCheckClient;
use super::schema::{FieldSpec, FormSchema};
use super::value::{ErrorMap, FieldErrors, FieldValue, Submission, UploadedFile, ValueMap};
use crate::field_type::FieldType;

/// Message recorded for a required field with no usable value.
pub const REQUIRED_MESSAGE: &str = "required";

/// Evaluates submissions against built schemas. Holds no per-request state.
#[derive(Clone)]
pub struct SubmissionEvaluator {
    client: Arc<dyn ExternalCheckClient>,
    settings: CoercionSettings,
}

impl SubmissionEvaluator {
    pub fn new(client: Arc<dyn ExternalCheckClient>, settings: CoercionSettings) -> Self {
        Self { client, settings }
    }

    /// Coerce and validate `submission` against `schema`.
    ///
    /// Succeeds only when no field at any depth produced an error.
    pub async fn evaluate(
        &self,
        schema: &FormSchema,
        submission: &Submission,
    ) -> Result<ValueMap, ErrorMap> {
        let result = self
            .evaluate_form(schema, &submission.data, &submission.files, None)
            .await;
        match &result {
            Ok(values) => {
                tracing::debug!(form = %schema.slug, fields = values.len(), "Submission accepted")
            }
            Err(errors) => {
                tracing::debug!(form = %schema.slug, failed = errors.len(), "Submission rejected")
            }
        }
        result
    }

    fn evaluate_form<'a>(
        &'a self,
        schema: &'a FormSchema,
        data: &'a Map<String, Value>,
        files: &'a HashMap<String, UploadedFile>,
        prefix: Option<String>,
    ) -> BoxFuture<'a, Result<ValueMap, ErrorMap>> {
        async move {
            let mut values = ValueMap::new();
            let mut errors = ErrorMap::new();

            for (name, spec) in &schema.fields {
                if spec.binding.hidden {
                    continue;
                }
                let path = match &prefix {
                    Some(p) => format!("{p}.{name}"),
                    None => name.clone(),
                };
                let raw = data.get(name);

                if let Some(nested) = &spec.nested {
                    let empty = Map::new();
                    let object = match raw {
                        None | Some(Value::Null) => &empty,
                        Some(Value::Object(object)) => object,
                        Some(_) => {
                            let err = CoercionError::Invalid {
                                expected: "nested form",
                            };
                            errors.insert(name.clone(), FieldErrors::Messages(err.messages()));
                            continue;
                        }
                    };
                    match self.evaluate_form(nested, object, files, Some(path)).await {
                        Ok(inner) => {
                            values.insert(name.clone(), FieldValue::Nested(inner));
                        }
                        Err(inner) => {
                            errors.insert(name.clone(), FieldErrors::Nested(inner));
                        }
                    }
                    continue;
                }

                match self.evaluate_field(spec, raw, files.get(&path)).await {
                    Ok(value) => {
                        values.insert(name.clone(), value);
                    }
                    Err(messages) => {
                        errors.insert(name.clone(), FieldErrors::Messages(messages));
                    }
                }
            }

            if errors.is_empty() {
                Ok(values)
            } else {
                Err(errors)
            }
        }
        .boxed()
    }

    async fn evaluate_field(
        &self,
        spec: &FieldSpec,
        raw: Option<&Value>,
        file: Option<&UploadedFile>,
    ) -> Result<FieldValue, Vec<String>> {
        let binding = &spec.binding;
        let input = match (binding.field_type, file) {
            (FieldType::File, Some(file)) => Some(RawInput::File(file)),
            _ => raw.filter(|v| !is_blank(v)).map(RawInput::Json),
        };

        let Some(input) = input else {
            return if binding.required {
                Err(vec![REQUIRED_MESSAGE.to_string()])
            } else {
                Ok(FieldValue::Empty)
            };
        };

        let value = spec
            .handler
            .coerce(input, &binding.options, &self.settings)
            .map_err(|e| e.messages())?;

        if binding.required && value == FieldValue::Bool(false) {
            return Err(vec![REQUIRED_MESSAGE.to_string()]);
        }

        let client = self.client.as_ref();
        let outcomes = join_all(spec.validators.iter().map(|v| v.run(&value, client))).await;
        let messages: Vec<String> = outcomes
            .into_iter()
            .filter_map(|outcome| outcome.err().map(|e| e.to_string()))
            .collect();

        if messages.is_empty() {
            Ok(value)
        } else {
            Err(messages)
        }
    }
}

/// Missing, null, blank strings and empty lists count as absent.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
