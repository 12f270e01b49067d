//! Shared response envelope types for API handlers.

use dynforms_core::validation::value::{ErrorMap, ValueMap};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Outcome of a form submission.
///
/// Serializes as `{"success": true, "data": ...}` or
/// `{"success": false, "errors": ...}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubmissionResponse {
    Accepted { success: bool, data: ValueMap },
    Rejected { success: bool, errors: ErrorMap },
}

impl SubmissionResponse {
    pub fn accepted(data: ValueMap) -> Self {
        Self::Accepted {
            success: true,
            data,
        }
    }

    pub fn rejected(errors: ErrorMap) -> Self {
        Self::Rejected {
            success: false,
            errors,
        }
    }
}
