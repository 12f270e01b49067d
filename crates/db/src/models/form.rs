//! Form entity model and DTOs.

use dynforms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Form {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub is_archived: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a form. The slug is derived from the name when absent.
#[derive(Debug, Deserialize)]
pub struct CreateForm {
    pub name: String,
    pub slug: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
