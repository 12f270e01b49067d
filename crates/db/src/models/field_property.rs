//! Field property (form-to-field binding) model and DTOs.

use dynforms_core::types::{DbId, Timestamp};
use dynforms_core::validation::store::FieldBindingRecord;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A row from the `field_properties` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FieldProperty {
    pub id: DbId,
    pub form_id: DbId,
    pub field_id: DbId,
    pub required: bool,
    pub hidden: bool,
    pub options: Json<Vec<String>>,
    /// Rule strings, e.g. `"min_length:8"`.
    pub validation: Json<Vec<String>>,
    pub style: Option<String>,
    pub order_index: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for binding a field to a form.
#[derive(Debug, Default, Deserialize)]
pub struct CreateFieldProperty {
    pub form_id: DbId,
    pub field_id: DbId,
    pub required: Option<bool>,
    pub hidden: Option<bool>,
    pub options: Option<Vec<String>>,
    pub validation: Option<Vec<String>>,
    pub style: Option<String>,
    pub order_index: Option<i32>,
}

/// A field property joined with its field, as the engine consumes it.
#[derive(Debug, Clone, FromRow)]
pub struct FieldBindingRow {
    pub id: DbId,
    pub field_type: String,
    pub name: String,
    pub label: String,
    pub required: bool,
    pub hidden: bool,
    pub options: Json<Vec<String>>,
    pub validation: Json<Vec<String>>,
    pub order_index: i32,
    pub style: Option<String>,
    pub nested_form_id: Option<DbId>,
}

impl From<FieldBindingRow> for FieldBindingRecord {
    fn from(row: FieldBindingRow) -> Self {
        Self {
            id: row.id,
            field_type: row.field_type,
            name: row.name,
            label: row.label,
            required: row.required,
            hidden: row.hidden,
            options: row.options.0,
            rule_strings: row.validation.0,
            order_index: row.order_index,
            style: row.style,
            nested_form_id: row.nested_form_id,
        }
    }
}
