//! [`FormStore`] backed by PostgreSQL.

use async_trait::async_trait;
use dynforms_core::error::CoreError;
use dynforms_core::types::DbId;
use dynforms_core::validation::store::{FieldBindingRecord, FormStore, StoredForm};

use crate::models::form::Form;
use crate::repositories::{FieldPropertyRepo, FormRepo};
use crate::DbPool;

pub struct PgFormStore {
    pool: DbPool,
}

impl PgFormStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn stored(form: Form) -> StoredForm {
    StoredForm {
        id: form.id,
        name: form.name,
        slug: form.slug,
    }
}

fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Form store query failed");
    CoreError::Internal(format!("form store: {err}"))
}

#[async_trait]
impl FormStore for PgFormStore {
    async fn get_form(&self, slug: &str) -> Result<Option<StoredForm>, CoreError> {
        let form = FormRepo::find_by_slug(&self.pool, slug)
            .await
            .map_err(internal)?;
        Ok(form.map(stored))
    }

    async fn get_form_by_id(&self, id: DbId) -> Result<Option<StoredForm>, CoreError> {
        let form = FormRepo::find_by_id(&self.pool, id).await.map_err(internal)?;
        Ok(form.map(stored))
    }

    async fn get_field_bindings(
        &self,
        form_id: DbId,
    ) -> Result<Vec<FieldBindingRecord>, CoreError> {
        let rows = FieldPropertyRepo::list_bindings(&self.pool, form_id)
            .await
            .map_err(internal)?;
        Ok(rows.into_iter().map(FieldBindingRecord::from).collect())
    }
}
