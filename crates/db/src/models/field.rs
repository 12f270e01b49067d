//! Field entity model and DTOs.
//!
//! A field is a reusable definition (name, label, type tag). Its per-form
//! settings live in `field_properties`.

use dynforms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `fields` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Field {
    pub id: DbId,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub nested_form_id: Option<DbId>,
    pub slug: String,
    pub is_archived: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a field. The label defaults to the name.
#[derive(Debug, Deserialize)]
pub struct CreateField {
    pub name: String,
    pub label: Option<String>,
    pub field_type: String,
    pub nested_form_id: Option<DbId>,
}
