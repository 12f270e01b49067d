//! Schema building.
//!
//! [`SchemaBuilder`] loads a form's bindings from a [`FormStore`], checks
//! every binding invariant, parses rule strings once, compiles validators
//! and resolves nested forms recursively. The result is an immutable
//! [`FormSchema`] shared through `Arc`.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;

use super::error::ConfigError;
use super::registry::{self, FieldTypeHandler};
use super::rules::{self, Rule};
use super::store::{FieldBindingRecord, FormStore, StoredForm};
use super::validators::Validator;
use crate::error::CoreError;
use crate::field_type::FieldType;
use crate::types::DbId;

/// A binding whose type tag and rule strings have been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    pub id: DbId,
    pub field_type: FieldType,
    pub name: String,
    pub label: String,
    pub required: bool,
    pub hidden: bool,
    pub options: Vec<String>,
    /// Rule strings as stored, for display.
    pub rule_strings: Vec<String>,
    pub rules: Vec<Rule>,
    pub order_index: i32,
    pub style: Option<String>,
    pub nested_form_id: Option<DbId>,
}

/// Everything needed to evaluate one field.
#[derive(Debug)]
pub struct FieldSpec {
    pub binding: FieldBinding,
    pub handler: FieldTypeHandler,
    pub validators: Vec<Validator>,
    /// Present exactly when the binding is of type `nested`.
    pub nested: Option<Arc<FormSchema>>,
}

/// A built form: its fields in evaluation order.
#[derive(Debug)]
pub struct FormSchema {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub fields: IndexMap<String, FieldSpec>,
}

/// Parse and check one stored binding. Nested forms are resolved by the caller.
pub fn compile_binding(record: FieldBindingRecord) -> Result<FieldSpec, ConfigError> {
    let field_type =
        FieldType::from_str(&record.field_type).map_err(|_| ConfigError::UnknownFieldType {
            field: record.name.clone(),
            tag: record.field_type.clone(),
        })?;
    let handler = registry::resolve(field_type);
    let field = || record.name.clone();

    if record.required && record.hidden {
        return Err(ConfigError::RequiredHidden { field: field() });
    }
    if handler.requires_options() && record.options.is_empty() {
        return Err(ConfigError::EmptyOptions {
            field: field(),
            field_type,
        });
    }
    match (field_type, record.nested_form_id) {
        (FieldType::Nested, None) => {
            return Err(ConfigError::MissingNestedReference { field: field() })
        }
        (ty, Some(_)) if ty != FieldType::Nested => {
            return Err(ConfigError::UnexpectedNestedReference { field: field() })
        }
        _ => {}
    }

    let rules = rules::parse_rules(&record.rule_strings, &record.name, field_type)?;
    if handler.requires_external_rule() && !rules.iter().any(|r| r.kind().is_external()) {
        return Err(ConfigError::MissingExternalRule {
            field: field(),
            field_type,
        });
    }
    let validators = handler.compile_validators(&rules);

    Ok(FieldSpec {
        binding: FieldBinding {
            id: record.id,
            field_type,
            name: record.name,
            label: record.label,
            required: record.required,
            hidden: record.hidden,
            options: record.options,
            rule_strings: record.rule_strings,
            rules,
            order_index: record.order_index,
            style: record.style,
            nested_form_id: record.nested_form_id,
        },
        handler,
        validators,
        nested: None,
    })
}

/// Builds [`FormSchema`]s from a [`FormStore`].
#[derive(Clone)]
pub struct SchemaBuilder {
    store: Arc<dyn FormStore>,
}

impl SchemaBuilder {
    pub fn new(store: Arc<dyn FormStore>) -> Self {
        Self { store }
    }

    /// Build the schema of the non-archived form with this slug.
    pub async fn build(&self, slug: &str) -> Result<Arc<FormSchema>, CoreError> {
        let form = self
            .store
            .get_form(slug)
            .await?
            .ok_or_else(|| CoreError::form_not_found(slug))?;
        self.build_form(form, Vec::new()).await
    }

    pub async fn build_by_id(&self, form_id: DbId) -> Result<Arc<FormSchema>, CoreError> {
        let form = self
            .store
            .get_form_by_id(form_id)
            .await?
            .ok_or_else(|| CoreError::form_not_found(form_id))?;
        self.build_form(form, Vec::new()).await
    }

    /// Build `form`, with `chain` holding the forms above it on this branch.
    ///
    /// The chain is cloned per nested binding, so siblings never see each
    /// other's descendants and diamonds (A -> B -> D, A -> C -> D) are legal.
    fn build_form(
        &self,
        form: StoredForm,
        mut chain: Vec<StoredForm>,
    ) -> BoxFuture<'_, Result<Arc<FormSchema>, CoreError>> {
        async move {
            let records = self.store.get_field_bindings(form.id).await?;
            chain.push(form.clone());

            let mut fields = IndexMap::with_capacity(records.len());
            for record in records {
                let mut spec = compile_binding(record)?;
                let name = spec.binding.name.clone();

                if fields.contains_key(&name) {
                    return Err(ConfigError::DuplicateFieldName {
                        form: form.slug.clone(),
                        field: name,
                    }
                    .into());
                }

                if let Some(target_id) = spec.binding.nested_form_id {
                    let target = self.store.get_form_by_id(target_id).await?.ok_or_else(|| {
                        ConfigError::MissingNestedForm {
                            field: name.clone(),
                            form_id: target_id,
                        }
                    })?;

                    if chain.iter().any(|f| f.id == target.id) {
                        let mut names: Vec<String> =
                            chain.iter().map(|f| f.slug.clone()).collect();
                        names.push(target.slug);
                        return Err(ConfigError::NestedCycle { chain: names }.into());
                    }

                    spec.nested = Some(self.build_form(target, chain.clone()).await?);
                }

                fields.insert(name, spec);
            }

            tracing::debug!(
                form = %form.slug,
                fields = fields.len(),
                depth = chain.len(),
                "Built form schema"
            );

            Ok(Arc::new(FormSchema {
                id: form.id,
                name: form.name,
                slug: form.slug,
                fields,
            }))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::validation::store::InMemoryFormStore;

    fn builder(store: InMemoryFormStore) -> SchemaBuilder {
        SchemaBuilder::new(Arc::new(store))
    }

    fn config_err(result: Result<Arc<FormSchema>, CoreError>) -> ConfigError {
        match result {
            Err(CoreError::Config(e)) => e,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn builds_fields_in_order() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "Signup",
            "signup",
            vec![
                FieldBindingRecord::new(1, "email", "email").at(2),
                FieldBindingRecord::new(2, "name", "text")
                    .required()
                    .with_rules(&["min_length:3"])
                    .at(1),
            ],
        );
        let schema = builder(store).build("signup").await.unwrap();

        let names: Vec<&str> = schema.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "email"]);
        assert_eq!(schema.fields["name"].validators, vec![Validator::MinLength(3)]);
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let result = builder(InMemoryFormStore::new()).build("nope").await;
        assert_matches!(result, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn required_hidden_fails_build() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "secret", "text").required().hidden()],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::RequiredHidden { .. }
        );
    }

    #[tokio::test]
    async fn choice_without_options_fails_build() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "colour", "radio")],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::EmptyOptions { field_type: FieldType::Radio, .. }
        );
    }

    #[tokio::test]
    async fn malformed_rule_fails_build() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "name", "text").with_rules(&["min_length:abc"])],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::MalformedRule { .. }
        );
    }

    #[tokio::test]
    async fn unknown_type_tag_fails_build() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "x", "colour_picker")],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::UnknownFieldType { .. }
        );
    }

    #[tokio::test]
    async fn identifier_types_need_an_external_rule() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "pin", "kra_pin")],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::MissingExternalRule { .. }
        );

        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "pin", "kra_pin")
                .with_rules(&["evaluation_url:https://kra.example.com/pin"])],
        );
        assert!(builder(store).build("f").await.is_ok());
    }

    #[tokio::test]
    async fn nested_reference_invariants() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "inner", "nested")],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::MissingNestedReference { .. }
        );

        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "name", "text").nested(2)],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::UnexpectedNestedReference { .. }
        );

        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![FieldBindingRecord::new(1, "inner", "nested").nested(99)],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::MissingNestedForm { form_id: 99, .. }
        );
    }

    #[tokio::test]
    async fn duplicate_field_names_fail_build() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "F",
            "f",
            vec![
                FieldBindingRecord::new(1, "name", "text"),
                FieldBindingRecord::new(2, "name", "email"),
            ],
        );
        assert_matches!(
            config_err(builder(store).build("f").await),
            ConfigError::DuplicateFieldName { .. }
        );
    }

    #[tokio::test]
    async fn two_form_cycle_is_named() {
        let store = InMemoryFormStore::new()
            .with_form(1, "A", "a", vec![FieldBindingRecord::new(1, "b", "nested").nested(2)])
            .with_form(2, "B", "b", vec![FieldBindingRecord::new(2, "a", "nested").nested(1)]);
        let err = config_err(builder(store).build("a").await);
        assert_eq!(
            err,
            ConfigError::NestedCycle {
                chain: vec!["a".into(), "b".into(), "a".into()]
            }
        );
        assert_eq!(err.to_string(), "nested form cycle: a -> b -> a");
    }

    #[tokio::test]
    async fn self_reference_is_a_cycle() {
        let store = InMemoryFormStore::new().with_form(
            1,
            "A",
            "a",
            vec![FieldBindingRecord::new(1, "me", "nested").nested(1)],
        );
        assert_matches!(
            config_err(builder(store).build("a").await),
            ConfigError::NestedCycle { .. }
        );
    }

    #[tokio::test]
    async fn diamond_is_not_a_cycle() {
        let store = InMemoryFormStore::new()
            .with_form(
                1,
                "A",
                "a",
                vec![
                    FieldBindingRecord::new(1, "b", "nested").nested(2),
                    FieldBindingRecord::new(2, "c", "nested").nested(3),
                ],
            )
            .with_form(2, "B", "b", vec![FieldBindingRecord::new(3, "d", "nested").nested(4)])
            .with_form(3, "C", "c", vec![FieldBindingRecord::new(4, "d", "nested").nested(4)])
            .with_form(4, "D", "d", vec![FieldBindingRecord::new(5, "x", "text")]);

        let schema = builder(store).build("a").await.unwrap();
        let b = schema.fields["b"].nested.as_ref().unwrap();
        let c = schema.fields["c"].nested.as_ref().unwrap();
        assert_eq!(b.fields["d"].nested.as_ref().unwrap().slug, "d");
        assert_eq!(c.fields["d"].nested.as_ref().unwrap().slug, "d");
    }

    #[tokio::test]
    async fn build_by_id_reaches_archived_forms() {
        let store = InMemoryFormStore::new()
            .with_form(1, "Old", "old", vec![FieldBindingRecord::new(1, "x", "text")])
            .archive(1);
        let builder = builder(store);
        assert_matches!(builder.build("old").await, Err(CoreError::NotFound { .. }));
        assert_eq!(builder.build_by_id(1).await.unwrap().slug, "old");
    }
}
