//! Repository for the `forms` table.

use dynforms_core::naming::slugify;
use dynforms_core::types::DbId;
use sqlx::PgPool;

use crate::models::form::{CreateForm, Form};

/// Column list for `forms` queries.
const COLUMNS: &str = "id, name, slug, is_archived, metadata, created_at, updated_at";

/// Provides CRUD operations for forms.
pub struct FormRepo;

impl FormRepo {
    /// Insert a new form, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateForm) -> Result<Form, sqlx::Error> {
        let slug = input
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&input.name));
        let query = format!(
            "INSERT INTO forms (name, slug, metadata) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(&input.name)
            .bind(&slug)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Find a form by ID, archived or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Form>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forms WHERE id = $1");
        sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a non-archived form by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Form>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM forms WHERE slug = $1 AND is_archived = FALSE");
        sqlx::query_as::<_, Form>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Archive a form. Returns `true` if a row changed.
    pub async fn archive(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE forms SET is_archived = TRUE WHERE id = $1 AND is_archived = FALSE")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
