//! Repository for the `fields` table.

use dynforms_core::naming::slugify;
use sqlx::PgPool;

use crate::models::field::{CreateField, Field};

/// Column list for `fields` queries.
const COLUMNS: &str = "\
    id, name, label, field_type, nested_form_id, slug, is_archived, \
    metadata, created_at, updated_at";

/// Creates reusable field definitions.
pub struct FieldRepo;

impl FieldRepo {
    /// Insert a new field, returning the created row.
    ///
    /// The type tag is stored as given; it is checked when a schema is built.
    pub async fn create(pool: &PgPool, input: &CreateField) -> Result<Field, sqlx::Error> {
        let label = input.label.clone().unwrap_or_else(|| input.name.clone());
        let query = format!(
            "INSERT INTO fields (name, label, field_type, nested_form_id, slug) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Field>(&query)
            .bind(&input.name)
            .bind(&label)
            .bind(&input.field_type)
            .bind(input.nested_form_id)
            .bind(slugify(&input.name))
            .fetch_one(pool)
            .await
    }
}
