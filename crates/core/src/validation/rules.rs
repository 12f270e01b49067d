//! Rule strings and their typed form.
//!
//! Constraints are stored as `"<rule_name>:<value>[,<value>]"` strings.
//! [`parse_rule`] turns one into a [`Rule`] once, at schema-build time,
//! with full-string matching per rule kind. Anything that does not match
//! exactly is a [`ConfigError`]; runtime validation never re-parses.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use super::coercion::parse_datetime;
use super::error::ConfigError;
use super::registry;
use crate::field_type::FieldType;

static UINT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid regex"));

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}),(\d{4}-\d{2}-\d{2})$").expect("valid regex")
});

static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2}),(\d{2}:\d{2}:\d{2})$").expect("valid regex")
});

const DATETIME_PATTERN: &str =
    r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?";

static DATETIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^({DATETIME_PATTERN}),({DATETIME_PATTERN})$")).expect("valid regex")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[a-zA-Z0-9.-]+(?::\d+)?(?:/[a-zA-Z0-9._-]+)*$").expect("valid regex")
});

/// The kind of a rule, independent of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    MinLength,
    MaxLength,
    MinValue,
    MaxValue,
    DateRange,
    TimeRange,
    DateTimeRange,
    ValidationUrl,
    EvaluationUrl,
}

impl RuleKind {
    pub const ALL: [RuleKind; 9] = [
        RuleKind::MinLength,
        RuleKind::MaxLength,
        RuleKind::MinValue,
        RuleKind::MaxValue,
        RuleKind::DateRange,
        RuleKind::TimeRange,
        RuleKind::DateTimeRange,
        RuleKind::ValidationUrl,
        RuleKind::EvaluationUrl,
    ];

    /// The rule name as written before the `:` in a rule string.
    pub fn name(self) -> &'static str {
        match self {
            RuleKind::MinLength => "min_length",
            RuleKind::MaxLength => "max_length",
            RuleKind::MinValue => "min_value",
            RuleKind::MaxValue => "max_value",
            RuleKind::DateRange => "date_range",
            RuleKind::TimeRange => "time_range",
            RuleKind::DateTimeRange => "datetime_range",
            RuleKind::ValidationUrl => "validation_url",
            RuleKind::EvaluationUrl => "evaluation_url",
        }
    }

    /// Human-readable grammar, used in configuration error messages.
    pub fn expected(self) -> &'static str {
        match self {
            RuleKind::MinLength => "'min_length:<unsigned integer>'",
            RuleKind::MaxLength => "'max_length:<unsigned integer>'",
            RuleKind::MinValue => "'min_value:<integer>'",
            RuleKind::MaxValue => "'max_value:<integer>'",
            RuleKind::DateRange => "'date_range:YYYY-MM-DD,YYYY-MM-DD'",
            RuleKind::TimeRange => "'time_range:HH:MM:SS,HH:MM:SS'",
            RuleKind::DateTimeRange => "'datetime_range:<ISO 8601>,<ISO 8601>'",
            RuleKind::ValidationUrl => "'validation_url:http(s)://host[:port][/path]'",
            RuleKind::EvaluationUrl => "'evaluation_url:http(s)://host[:port][/path]'",
        }
    }

    /// Whether this rule calls out to an external service.
    pub fn is_external(self) -> bool {
        matches!(self, RuleKind::ValidationUrl | RuleKind::EvaluationUrl)
    }

    fn from_name(name: &str) -> Option<Self> {
        RuleKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed, typed constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    MinLength(usize),
    MaxLength(usize),
    MinValue(i64),
    MaxValue(i64),
    DateRange { start: NaiveDate, end: NaiveDate },
    TimeRange { start: NaiveTime, end: NaiveTime },
    DateTimeRange { start: DateTime<Utc>, end: DateTime<Utc> },
    ExternalValidationUrl(String),
    ExternalEvaluationUrl(String),
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::MinLength(_) => RuleKind::MinLength,
            Rule::MaxLength(_) => RuleKind::MaxLength,
            Rule::MinValue(_) => RuleKind::MinValue,
            Rule::MaxValue(_) => RuleKind::MaxValue,
            Rule::DateRange { .. } => RuleKind::DateRange,
            Rule::TimeRange { .. } => RuleKind::TimeRange,
            Rule::DateTimeRange { .. } => RuleKind::DateTimeRange,
            Rule::ExternalValidationUrl(_) => RuleKind::ValidationUrl,
            Rule::ExternalEvaluationUrl(_) => RuleKind::EvaluationUrl,
        }
    }
}

/// Parse one rule string for a binding named `field` of type `field_type`.
///
/// The rule name selects the grammar; the name must be known and accepted
/// by the field type, and the remainder must match the grammar in full.
pub fn parse_rule(raw: &str, field: &str, field_type: FieldType) -> Result<Rule, ConfigError> {
    let (name, value) = raw.split_once(':').unwrap_or((raw, ""));

    let kind = RuleKind::from_name(name).ok_or_else(|| ConfigError::UnknownRule {
        field: field.to_string(),
        rule: raw.to_string(),
    })?;

    if !registry::resolve(field_type)
        .accepted_rule_kinds()
        .contains(&kind)
    {
        return Err(ConfigError::IncompatibleRule {
            field: field.to_string(),
            rule: raw.to_string(),
            field_type,
        });
    }

    let malformed = || ConfigError::MalformedRule {
        field: field.to_string(),
        rule: raw.to_string(),
        expected: kind.expected(),
    };
    let reversed = || ConfigError::InvalidRange {
        field: field.to_string(),
        rule: raw.to_string(),
    };

    match kind {
        RuleKind::MinLength | RuleKind::MaxLength => {
            if !UINT_RE.is_match(value) {
                return Err(malformed());
            }
            let n: usize = value.parse().map_err(|_| malformed())?;
            Ok(if kind == RuleKind::MinLength {
                Rule::MinLength(n)
            } else {
                Rule::MaxLength(n)
            })
        }
        RuleKind::MinValue | RuleKind::MaxValue => {
            if !INT_RE.is_match(value) {
                return Err(malformed());
            }
            let n: i64 = value.parse().map_err(|_| malformed())?;
            Ok(if kind == RuleKind::MinValue {
                Rule::MinValue(n)
            } else {
                Rule::MaxValue(n)
            })
        }
        RuleKind::DateRange => {
            let caps = DATE_RANGE_RE.captures(value).ok_or_else(malformed)?;
            let start =
                NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").map_err(|_| malformed())?;
            let end = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d").map_err(|_| malformed())?;
            if start > end {
                return Err(reversed());
            }
            Ok(Rule::DateRange { start, end })
        }
        RuleKind::TimeRange => {
            let caps = TIME_RANGE_RE.captures(value).ok_or_else(malformed)?;
            let start = NaiveTime::parse_from_str(&caps[1], "%H:%M:%S").map_err(|_| malformed())?;
            let end = NaiveTime::parse_from_str(&caps[2], "%H:%M:%S").map_err(|_| malformed())?;
            if start > end {
                return Err(reversed());
            }
            Ok(Rule::TimeRange { start, end })
        }
        RuleKind::DateTimeRange => {
            let caps = DATETIME_RANGE_RE.captures(value).ok_or_else(malformed)?;
            let start = parse_datetime(&caps[1]).ok_or_else(malformed)?;
            let end = parse_datetime(&caps[2]).ok_or_else(malformed)?;
            if start > end {
                return Err(reversed());
            }
            Ok(Rule::DateTimeRange { start, end })
        }
        RuleKind::ValidationUrl | RuleKind::EvaluationUrl => {
            if !URL_RE.is_match(value) {
                return Err(malformed());
            }
            let url = value.to_string();
            Ok(if kind == RuleKind::ValidationUrl {
                Rule::ExternalValidationUrl(url)
            } else {
                Rule::ExternalEvaluationUrl(url)
            })
        }
    }
}

/// Parse every rule string of a binding, keeping declaration order.
///
/// Each rule kind may appear at most once per binding.
pub fn parse_rules(
    raw: &[String],
    field: &str,
    field_type: FieldType,
) -> Result<Vec<Rule>, ConfigError> {
    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(raw.len());

    for rule_string in raw {
        let rule = parse_rule(rule_string, field, field_type)?;
        if !seen.insert(rule.kind()) {
            return Err(ConfigError::DuplicateRule {
                field: field.to_string(),
                rule: rule.kind().name().to_string(),
            });
        }
        rules.push(rule);
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn parse(raw: &str, ty: FieldType) -> Result<Rule, ConfigError> {
        parse_rule(raw, "f", ty)
    }

    #[test]
    fn length_rules() {
        assert_eq!(parse("min_length:8", FieldType::Text), Ok(Rule::MinLength(8)));
        assert_eq!(parse("max_length:0", FieldType::Password), Ok(Rule::MaxLength(0)));
        assert_eq!(parse("min_length:2", FieldType::Array), Ok(Rule::MinLength(2)));
    }

    #[test]
    fn value_rules_accept_negative_bounds() {
        assert_eq!(parse("min_value:-5", FieldType::Number), Ok(Rule::MinValue(-5)));
        assert_eq!(parse("max_value:100", FieldType::Currency), Ok(Rule::MaxValue(100)));
    }

    #[test]
    fn partial_matches_are_rejected() {
        for raw in [
            "min_length:8x",
            "min_length: 8",
            "min_length:",
            "min_length",
            "min_length:-1",
            "min_length:8.5",
        ] {
            assert_matches!(
                parse(raw, FieldType::Text),
                Err(ConfigError::MalformedRule { .. }),
                "{raw}"
            );
        }
    }

    #[test]
    fn non_integer_bound_is_malformed() {
        assert_matches!(
            parse("max_value:1e3", FieldType::Number),
            Err(ConfigError::MalformedRule { .. })
        );
        assert_matches!(
            parse("max_value:99999999999999999999", FieldType::Number),
            Err(ConfigError::MalformedRule { .. })
        );
    }

    #[test]
    fn unknown_rule_name() {
        assert_matches!(
            parse("regex:^a$", FieldType::Text),
            Err(ConfigError::UnknownRule { .. })
        );
    }

    #[test]
    fn rule_on_incompatible_type() {
        assert_matches!(
            parse("date_range:2020-01-01,2021-01-01", FieldType::Text),
            Err(ConfigError::IncompatibleRule { field_type: FieldType::Text, .. })
        );
        assert_matches!(
            parse("min_length:3", FieldType::Number),
            Err(ConfigError::IncompatibleRule { .. })
        );
    }

    #[test]
    fn date_range_rule() {
        let rule = parse("date_range:1980-01-01,2025-12-31", FieldType::Date).unwrap();
        assert_eq!(
            rule,
            Rule::DateRange {
                start: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            }
        );
        assert!(parse("date_range:1980-01-01,2025-12-31", FieldType::DateRange).is_ok());
    }

    #[test]
    fn date_range_rejects_impossible_dates_and_reversed_bounds() {
        assert_matches!(
            parse("date_range:2025-13-01,2025-12-31", FieldType::Date),
            Err(ConfigError::MalformedRule { .. })
        );
        assert_matches!(
            parse("date_range:2025-01-01,2024-01-01", FieldType::Date),
            Err(ConfigError::InvalidRange { .. })
        );
        assert_matches!(
            parse("date_range:2025-01-01", FieldType::Date),
            Err(ConfigError::MalformedRule { .. })
        );
    }

    #[test]
    fn time_range_rule() {
        let rule = parse("time_range:08:00:00,18:00:00", FieldType::Time).unwrap();
        assert_eq!(
            rule,
            Rule::TimeRange {
                start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            }
        );
        assert_matches!(
            parse("time_range:08:00,18:00", FieldType::Time),
            Err(ConfigError::MalformedRule { .. })
        );
    }

    #[test]
    fn datetime_range_normalizes_to_utc() {
        let rule = parse(
            "datetime_range:2024-01-01T08:00:00+03:00,2025-12-31 18:00:00",
            FieldType::DateTime,
        )
        .unwrap();
        assert_eq!(
            rule,
            Rule::DateTimeRange {
                start: Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2025, 12, 31, 18, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn external_url_rules() {
        assert_eq!(
            parse("validation_url:https://api.example.com/validate", FieldType::KraPin),
            Ok(Rule::ExternalValidationUrl("https://api.example.com/validate".into()))
        );
        assert_eq!(
            parse("evaluation_url:http://localhost:8080/eval", FieldType::NationalId),
            Ok(Rule::ExternalEvaluationUrl("http://localhost:8080/eval".into()))
        );
        assert_matches!(
            parse("validation_url:ftp://example.com", FieldType::KraPin),
            Err(ConfigError::MalformedRule { .. })
        );
        assert_matches!(
            parse("validation_url:https://example.com/a?b=c", FieldType::KraPin),
            Err(ConfigError::MalformedRule { .. })
        );
    }

    #[test]
    fn evaluation_url_is_dispatched_independently() {
        let rule = parse("evaluation_url:https://svc/v", FieldType::KraPin).unwrap();
        assert_eq!(rule.kind(), RuleKind::EvaluationUrl);
    }

    #[test]
    fn duplicate_kinds_are_rejected() {
        let raw = vec!["min_length:1".to_string(), "min_length:2".to_string()];
        assert_matches!(
            parse_rules(&raw, "f", FieldType::Text),
            Err(ConfigError::DuplicateRule { .. })
        );
    }

    #[test]
    fn parse_rules_keeps_declaration_order() {
        let raw = vec!["max_length:10".to_string(), "min_length:2".to_string()];
        assert_eq!(
            parse_rules(&raw, "f", FieldType::Text).unwrap(),
            vec![Rule::MaxLength(10), Rule::MinLength(2)]
        );
    }
}
