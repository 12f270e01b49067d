//! Persistence boundary for form definitions.
//!
//! The engine reads stored forms and their field bindings through
//! [`FormStore`]. `dynforms-db` provides the PostgreSQL implementation;
//! [`InMemoryFormStore`] backs tests and embedding without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// A stored form header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredForm {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

/// A stored field binding, before any parsing.
///
/// `field_type` is the raw tag and `rule_strings` the raw constraint
/// strings; both are checked when a schema is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBindingRecord {
    pub id: DbId,
    pub field_type: String,
    pub name: String,
    pub label: String,
    pub required: bool,
    pub hidden: bool,
    pub options: Vec<String>,
    pub rule_strings: Vec<String>,
    pub order_index: i32,
    pub style: Option<String>,
    pub nested_form_id: Option<DbId>,
}

impl FieldBindingRecord {
    /// An optional, visible binding labelled with its name.
    pub fn new(id: DbId, name: &str, field_type: &str) -> Self {
        Self {
            id,
            field_type: field_type.to_string(),
            name: name.to_string(),
            label: name.to_string(),
            required: false,
            hidden: false,
            options: Vec::new(),
            rule_strings: Vec::new(),
            order_index: 0,
            style: None,
            nested_form_id: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn with_rules(mut self, rules: &[&str]) -> Self {
        self.rule_strings = rules.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn at(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    pub fn nested(mut self, form_id: DbId) -> Self {
        self.nested_form_id = Some(form_id);
        self
    }
}

/// Read access to stored form definitions.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Look up a non-archived form by slug.
    async fn get_form(&self, slug: &str) -> Result<Option<StoredForm>, CoreError>;

    /// Look up a form by id. Archived forms are still returned so that
    /// nested references to them keep resolving.
    async fn get_form_by_id(&self, id: DbId) -> Result<Option<StoredForm>, CoreError>;

    /// Field bindings of a form, ordered by `order_index` then id.
    async fn get_field_bindings(&self, form_id: DbId)
        -> Result<Vec<FieldBindingRecord>, CoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct InMemoryFormStore {
    forms: Vec<(StoredForm, bool)>,
    bindings: HashMap<DbId, Vec<FieldBindingRecord>>,
}

impl InMemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a form with its bindings. Replaces any form with the same id.
    pub fn with_form(
        mut self,
        id: DbId,
        name: &str,
        slug: &str,
        bindings: Vec<FieldBindingRecord>,
    ) -> Self {
        self.forms.retain(|(f, _)| f.id != id);
        self.forms.push((
            StoredForm {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
            },
            false,
        ));
        self.bindings.insert(id, bindings);
        self
    }

    /// Mark a form as archived.
    pub fn archive(mut self, id: DbId) -> Self {
        for (form, archived) in &mut self.forms {
            if form.id == id {
                *archived = true;
            }
        }
        self
    }
}

#[async_trait]
impl FormStore for InMemoryFormStore {
    async fn get_form(&self, slug: &str) -> Result<Option<StoredForm>, CoreError> {
        Ok(self
            .forms
            .iter()
            .find(|(f, archived)| !archived && f.slug == slug)
            .map(|(f, _)| f.clone()))
    }

    async fn get_form_by_id(&self, id: DbId) -> Result<Option<StoredForm>, CoreError> {
        Ok(self
            .forms
            .iter()
            .find(|(f, _)| f.id == id)
            .map(|(f, _)| f.clone()))
    }

    async fn get_field_bindings(
        &self,
        form_id: DbId,
    ) -> Result<Vec<FieldBindingRecord>, CoreError> {
        let mut bindings = self.bindings.get(&form_id).cloned().unwrap_or_default();
        bindings.sort_by_key(|b| (b.order_index, b.id));
        Ok(bindings)
    }
}
