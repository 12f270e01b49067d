//! Error kinds raised while building schemas and evaluating submissions.
//!
//! - [`ConfigError`]: a schema authoring defect, detected at build time.
//! - [`CoercionError`]: a submitted value cannot take the field's typed form.
//! - [`ValidationError`]: a typed value fails a compiled validator.

use crate::field_type::FieldType;

/// A defect in a stored form definition. Fatal to building that schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("field '{field}': unknown field type '{tag}'")]
    UnknownFieldType { field: String, tag: String },

    #[error("field '{field}': unknown rule '{rule}'")]
    UnknownRule { field: String, rule: String },

    #[error("field '{field}': malformed rule '{rule}', expected {expected}")]
    MalformedRule {
        field: String,
        rule: String,
        expected: &'static str,
    },

    #[error("field '{field}': rule '{rule}' is not accepted by field type '{field_type}'")]
    IncompatibleRule {
        field: String,
        rule: String,
        field_type: FieldType,
    },

    #[error("field '{field}': rule '{rule}' is declared more than once")]
    DuplicateRule { field: String, rule: String },

    #[error("field '{field}': rule '{rule}' has a start after its end")]
    InvalidRange { field: String, rule: String },

    #[error("field '{field}': type '{field_type}' requires a validation_url or evaluation_url rule")]
    MissingExternalRule { field: String, field_type: FieldType },

    #[error("field '{field}': options are required for type '{field_type}'")]
    EmptyOptions { field: String, field_type: FieldType },

    #[error("field '{field}': required cannot be true if hidden is true")]
    RequiredHidden { field: String },

    #[error("field '{field}': nested fields must reference a form")]
    MissingNestedReference { field: String },

    #[error("field '{field}': only nested fields may reference a form")]
    UnexpectedNestedReference { field: String },

    #[error("field '{field}': nested form {form_id} does not exist")]
    MissingNestedForm { field: String, form_id: i64 },

    #[error("nested form cycle: {}", .chain.join(" -> "))]
    NestedCycle { chain: Vec<String> },

    #[error("form '{form}': field name '{field}' is used more than once")]
    DuplicateFieldName { form: String, field: String },
}

/// A submitted value that cannot be converted to the field's typed form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("Enter a valid {expected}.")]
    Invalid { expected: &'static str },

    #[error("Select a valid choice. {value} is not one of the available choices.")]
    InvalidChoice { value: String },

    #[error("'{code}' is not a valid currency code.")]
    UnknownCurrency { code: String },

    #[error("Ensure that there are no more than {max} decimal places.")]
    TooManyDecimalPlaces { max: u32 },

    #[error("The start must not be after the end.")]
    ReversedRange,

    #[error("The submitted file is empty.")]
    EmptyFile,

    #[error("{} item(s) in the array did not validate.", .0.len())]
    InvalidItems(Vec<String>),
}

impl CoercionError {
    /// The messages to record under the field name.
    ///
    /// Array failures expand to one message per rejected element.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CoercionError::InvalidItems(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// A typed value that failed a compiled validator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Ensure this value has at least {min} characters (it has {actual}).")]
    MinLength { min: usize, actual: usize },

    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    MaxLength { max: usize, actual: usize },

    #[error("List contains {actual} items, it should contain no fewer than {min}.")]
    MinItems { min: usize, actual: usize },

    #[error("List contains {actual} items, it should contain no more than {max}.")]
    MaxItems { max: usize, actual: usize },

    #[error("Ensure this value is greater than or equal to {min}.")]
    MinValue { min: i64 },

    #[error("Ensure this value is less than or equal to {max}.")]
    MaxValue { max: i64 },

    #[error("Ensure {what} is between {start} and {end}.")]
    OutOfRange {
        what: &'static str,
        start: String,
        end: String,
    },

    #[error("Invalid value: {service} service responded with {status} {reason}.")]
    ExternalRejected {
        service: &'static str,
        status: u16,
        reason: String,
    },

    #[error("Invalid value: {service} service cannot check this value.")]
    ExternalUnsendable { service: &'static str },

    #[error("Could not verify value: {service} service timed out.")]
    ExternalTimeout { service: &'static str },

    #[error("Could not verify value: {service} service unreachable ({reason}).")]
    ExternalUnavailable {
        service: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_the_chain() {
        let err = ConfigError::NestedCycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "nested form cycle: a -> b -> a");
    }

    #[test]
    fn array_coercion_expands_per_item() {
        let err = CoercionError::InvalidItems(vec!["one".into(), "two".into()]);
        assert_eq!(err.messages(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(err.to_string(), "2 item(s) in the array did not validate.");
    }

    #[test]
    fn external_messages_are_distinct() {
        let rejected = ValidationError::ExternalRejected {
            service: "validation",
            status: 404,
            reason: "Not Found".into(),
        }
        .to_string();
        let timeout = ValidationError::ExternalTimeout {
            service: "validation",
        }
        .to_string();
        assert!(rejected.starts_with("Invalid value"));
        assert!(timeout.starts_with("Could not verify value"));
        assert_ne!(rejected, timeout);
    }
}
