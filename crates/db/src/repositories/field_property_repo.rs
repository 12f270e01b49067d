//! Repository for the `field_properties` table.

use dynforms_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::field_property::{CreateFieldProperty, FieldBindingRow, FieldProperty};

/// Column list for `field_properties` queries.
const COLUMNS: &str = "\
    id, form_id, field_id, required, hidden, options, validation, style, \
    order_index, created_at, updated_at";

/// Provides operations on form-to-field bindings.
pub struct FieldPropertyRepo;

impl FieldPropertyRepo {
    /// Bind a field to a form, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateFieldProperty,
    ) -> Result<FieldProperty, sqlx::Error> {
        let query = format!(
            "INSERT INTO field_properties \
                (form_id, field_id, required, hidden, options, validation, style, order_index) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FieldProperty>(&query)
            .bind(input.form_id)
            .bind(input.field_id)
            .bind(input.required.unwrap_or(false))
            .bind(input.hidden.unwrap_or(false))
            .bind(Json(input.options.clone().unwrap_or_default()))
            .bind(Json(input.validation.clone().unwrap_or_default()))
            .bind(&input.style)
            .bind(input.order_index.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    /// List a form's bindings joined with their fields, in binding order.
    pub async fn list_bindings(
        pool: &PgPool,
        form_id: DbId,
    ) -> Result<Vec<FieldBindingRow>, sqlx::Error> {
        sqlx::query_as::<_, FieldBindingRow>(
            "SELECT fp.id, f.field_type, f.name, f.label, fp.required, fp.hidden, \
                    fp.options, fp.validation, fp.order_index, fp.style, f.nested_form_id \
             FROM field_properties fp \
             JOIN fields f ON f.id = fp.field_id \
             WHERE fp.form_id = $1 \
             ORDER BY fp.order_index, fp.id",
        )
        .bind(form_id)
        .fetch_all(pool)
        .await
    }
}
