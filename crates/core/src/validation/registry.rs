//! Field type registry.
//!
//! Maps each [`FieldType`] to a [`FieldTypeHandler`] that knows which rule
//! kinds the type accepts, how to coerce raw input, and how to compile
//! parsed rules into runtime validators.

use super::coercion::{self, CoercionSettings, RawInput};
use super::error::CoercionError;
use super::rules::{Rule, RuleKind};
use super::validators::{ExternalKind, Validator};
use super::value::FieldValue;
use crate::field_type::FieldType;

const NO_RULES: &[RuleKind] = &[];

const LENGTH_RULES: &[RuleKind] = &[RuleKind::MinLength, RuleKind::MaxLength];

const VALUE_RULES: &[RuleKind] = &[RuleKind::MinValue, RuleKind::MaxValue];

const TEXT_RULES: &[RuleKind] = &[
    RuleKind::MinLength,
    RuleKind::MaxLength,
    RuleKind::ValidationUrl,
    RuleKind::EvaluationUrl,
];

const NUMBER_RULES: &[RuleKind] = &[
    RuleKind::MinValue,
    RuleKind::MaxValue,
    RuleKind::ValidationUrl,
    RuleKind::EvaluationUrl,
];

const DATE_RULES: &[RuleKind] = &[RuleKind::DateRange];

const TIME_RULES: &[RuleKind] = &[RuleKind::TimeRange];

const DATETIME_RULES: &[RuleKind] = &[RuleKind::DateTimeRange];

/// Behavior attached to one field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTypeHandler {
    field_type: FieldType,
}

/// Look up the handler for a field type.
pub fn resolve(field_type: FieldType) -> FieldTypeHandler {
    FieldTypeHandler { field_type }
}

impl FieldTypeHandler {
    pub fn field_type(self) -> FieldType {
        self.field_type
    }

    /// Rule kinds a binding of this type may declare.
    pub fn accepted_rule_kinds(self) -> &'static [RuleKind] {
        match self.field_type {
            FieldType::Text | FieldType::KraPin | FieldType::NationalId => TEXT_RULES,
            FieldType::Email
            | FieldType::Password
            | FieldType::Url
            | FieldType::PhoneNumber
            | FieldType::Array => LENGTH_RULES,
            FieldType::Number => NUMBER_RULES,
            FieldType::Float | FieldType::Currency => VALUE_RULES,
            FieldType::Date | FieldType::DateRange => DATE_RULES,
            FieldType::Time => TIME_RULES,
            FieldType::DateTime | FieldType::DateTimeRange => DATETIME_RULES,
            FieldType::Checkbox
            | FieldType::Country
            | FieldType::County
            | FieldType::Dropdown
            | FieldType::File
            | FieldType::Nested
            | FieldType::Radio
            | FieldType::Uuid => NO_RULES,
        }
    }

    /// Types that are only meaningful when checked by an external service.
    pub fn requires_external_rule(self) -> bool {
        matches!(self.field_type, FieldType::KraPin | FieldType::NationalId)
    }

    /// Choice types need a non-empty option list.
    pub fn requires_options(self) -> bool {
        self.field_type.is_choice()
    }

    pub fn coerce(
        self,
        input: RawInput<'_>,
        options: &[String],
        settings: &CoercionSettings,
    ) -> Result<FieldValue, CoercionError> {
        coercion::coerce(self.field_type, input, options, settings)
    }

    /// Compile parsed rules into validators, preserving declaration order.
    ///
    /// Length rules count characters, except on arrays where they count items.
    pub fn compile_validators(self, rules: &[Rule]) -> Vec<Validator> {
        let is_array = self.field_type == FieldType::Array;
        rules
            .iter()
            .map(|rule| match rule {
                Rule::MinLength(n) if is_array => Validator::MinItems(*n),
                Rule::MaxLength(n) if is_array => Validator::MaxItems(*n),
                Rule::MinLength(n) => Validator::MinLength(*n),
                Rule::MaxLength(n) => Validator::MaxLength(*n),
                Rule::MinValue(n) => Validator::MinValue(*n),
                Rule::MaxValue(n) => Validator::MaxValue(*n),
                Rule::DateRange { start, end } => Validator::DateRange {
                    start: *start,
                    end: *end,
                },
                Rule::TimeRange { start, end } => Validator::TimeRange {
                    start: *start,
                    end: *end,
                },
                Rule::DateTimeRange { start, end } => Validator::DateTimeRange {
                    start: *start,
                    end: *end,
                },
                Rule::ExternalValidationUrl(url) => Validator::External {
                    kind: ExternalKind::Validation,
                    url: url.clone(),
                },
                Rule::ExternalEvaluationUrl(url) => Validator::External {
                    kind: ExternalKind::Evaluation,
                    url: url.clone(),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_resolves() {
        for ty in FieldType::ALL {
            assert_eq!(resolve(ty).field_type(), ty);
        }
    }

    #[test]
    fn identifier_types_require_external_rule() {
        assert!(resolve(FieldType::KraPin).requires_external_rule());
        assert!(resolve(FieldType::NationalId).requires_external_rule());
        assert!(!resolve(FieldType::Text).requires_external_rule());
    }

    #[test]
    fn external_rules_only_on_text_like_and_number() {
        let with_external: Vec<FieldType> = FieldType::ALL
            .into_iter()
            .filter(|ty| {
                resolve(*ty)
                    .accepted_rule_kinds()
                    .contains(&RuleKind::ValidationUrl)
            })
            .collect();
        assert_eq!(
            with_external,
            vec![
                FieldType::KraPin,
                FieldType::NationalId,
                FieldType::Number,
                FieldType::Text
            ]
        );
    }

    #[test]
    fn array_length_rules_count_items() {
        let validators = resolve(FieldType::Array)
            .compile_validators(&[Rule::MinLength(1), Rule::MaxLength(3)]);
        assert_eq!(validators, vec![Validator::MinItems(1), Validator::MaxItems(3)]);

        let validators = resolve(FieldType::Text).compile_validators(&[Rule::MinLength(1)]);
        assert_eq!(validators, vec![Validator::MinLength(1)]);
    }

    #[test]
    fn compile_keeps_declaration_order() {
        let rules = [
            Rule::ExternalEvaluationUrl("https://svc/eval".into()),
            Rule::MaxValue(10),
        ];
        let validators = resolve(FieldType::Number).compile_validators(&rules);
        assert_eq!(
            validators,
            vec![
                Validator::External {
                    kind: ExternalKind::Evaluation,
                    url: "https://svc/eval".into()
                },
                Validator::MaxValue(10),
            ]
        );
    }
}
