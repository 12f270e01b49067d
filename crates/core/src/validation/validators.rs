//! Compiled runtime validators.
//!
//! Each validator checks one coerced [`FieldValue`]. Range checks are
//! inclusive at both ends. External validators delegate to the injected
//! [`ExternalCheckClient`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::error::ValidationError;
use super::external::{ExternalCheckClient, ExternalCheckError};
use super::value::FieldValue;

/// Which external rule a validator came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Validation,
    Evaluation,
}

impl ExternalKind {
    /// Service name used in error messages and logs.
    pub fn service(self) -> &'static str {
        match self {
            ExternalKind::Validation => "validation",
            ExternalKind::Evaluation => "evaluation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    MaxItems(usize),
    MinValue(i64),
    MaxValue(i64),
    DateRange { start: NaiveDate, end: NaiveDate },
    TimeRange { start: NaiveTime, end: NaiveTime },
    DateTimeRange { start: DateTime<Utc>, end: DateTime<Utc> },
    External { kind: ExternalKind, url: String },
}

impl Validator {
    /// Check one value. Values of a shape the validator does not apply to pass.
    pub async fn run(
        &self,
        value: &FieldValue,
        client: &dyn ExternalCheckClient,
    ) -> Result<(), ValidationError> {
        match self {
            Validator::MinLength(min) => match char_len(value) {
                Some(actual) if actual < *min => Err(ValidationError::MinLength {
                    min: *min,
                    actual,
                }),
                _ => Ok(()),
            },
            Validator::MaxLength(max) => match char_len(value) {
                Some(actual) if actual > *max => Err(ValidationError::MaxLength {
                    max: *max,
                    actual,
                }),
                _ => Ok(()),
            },
            Validator::MinItems(min) => match value {
                FieldValue::List(items) if items.len() < *min => Err(ValidationError::MinItems {
                    min: *min,
                    actual: items.len(),
                }),
                _ => Ok(()),
            },
            Validator::MaxItems(max) => match value {
                FieldValue::List(items) if items.len() > *max => Err(ValidationError::MaxItems {
                    max: *max,
                    actual: items.len(),
                }),
                _ => Ok(()),
            },
            Validator::MinValue(min) => match compare_to_bound(value, *min) {
                Some(std::cmp::Ordering::Less) => Err(ValidationError::MinValue { min: *min }),
                _ => Ok(()),
            },
            Validator::MaxValue(max) => match compare_to_bound(value, *max) {
                Some(std::cmp::Ordering::Greater) => {
                    Err(ValidationError::MaxValue { max: *max })
                }
                _ => Ok(()),
            },
            Validator::DateRange { start, end } => {
                let within = |d: &NaiveDate| start <= d && d <= end;
                let ok = match value {
                    FieldValue::Date(d) => within(d),
                    FieldValue::DateRange { start: s, end: e } => within(s) && within(e),
                    _ => true,
                };
                ok.then_some(()).ok_or_else(|| ValidationError::OutOfRange {
                    what: "date",
                    start: start.format("%Y-%m-%d").to_string(),
                    end: end.format("%Y-%m-%d").to_string(),
                })
            }
            Validator::TimeRange { start, end } => match value {
                FieldValue::Time(t) if t < start || t > end => Err(ValidationError::OutOfRange {
                    what: "time",
                    start: start.format("%H:%M:%S").to_string(),
                    end: end.format("%H:%M:%S").to_string(),
                }),
                _ => Ok(()),
            },
            Validator::DateTimeRange { start, end } => {
                let within = |d: &DateTime<Utc>| start <= d && d <= end;
                let ok = match value {
                    FieldValue::DateTime(d) => within(d),
                    FieldValue::DateTimeRange { start: s, end: e } => within(s) && within(e),
                    _ => true,
                };
                ok.then_some(()).ok_or_else(|| ValidationError::OutOfRange {
                    what: "date/time",
                    start: start.to_rfc3339(),
                    end: end.to_rfc3339(),
                })
            }
            Validator::External { kind, url } => {
                let Some(text) = value.as_text() else {
                    return Ok(());
                };
                run_external(*kind, url, &text, client).await
            }
        }
    }
}

async fn run_external(
    kind: ExternalKind,
    url: &str,
    value: &str,
    client: &dyn ExternalCheckClient,
) -> Result<(), ValidationError> {
    let service = kind.service();
    match client.check(url, value).await {
        Ok(()) => Ok(()),
        Err(ExternalCheckError::Rejected { status, reason }) => {
            tracing::debug!(service, url, status, "External check rejected value");
            Err(ValidationError::ExternalRejected {
                service,
                status,
                reason,
            })
        }
        Err(ExternalCheckError::UnsendableValue(_)) => {
            tracing::debug!(service, url, "External check refused unsendable value");
            Err(ValidationError::ExternalUnsendable { service })
        }
        Err(ExternalCheckError::Timeout) => {
            tracing::warn!(service, url, "External check timed out");
            Err(ValidationError::ExternalTimeout { service })
        }
        Err(ExternalCheckError::Transport(reason)) => {
            tracing::warn!(service, url, error = %reason, "External check unavailable");
            Err(ValidationError::ExternalUnavailable { service, reason })
        }
    }
}

fn char_len(value: &FieldValue) -> Option<usize> {
    match value {
        FieldValue::Text(s) => Some(s.chars().count()),
        _ => None,
    }
}

/// Compare a numeric value (integer, float or money amount) to an integer bound.
fn compare_to_bound(value: &FieldValue, bound: i64) -> Option<std::cmp::Ordering> {
    match value {
        FieldValue::Integer(n) => Some(n.cmp(&bound)),
        FieldValue::Float(f) => f.partial_cmp(&(bound as f64)),
        FieldValue::Money(m) => Some(m.amount.cmp(&Decimal::from(bound))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::validation::value::Money;

    struct RejectBad;

    #[async_trait]
    impl ExternalCheckClient for RejectBad {
        async fn check(&self, _url: &str, value: &str) -> Result<(), ExternalCheckError> {
            match value {
                "BAD" => Err(ExternalCheckError::Rejected {
                    status: 404,
                    reason: "Not Found".into(),
                }),
                "SLOW" => Err(ExternalCheckError::Timeout),
                "DOWN" => Err(ExternalCheckError::Transport("connection refused".into())),
                "." | ".." => Err(ExternalCheckError::UnsendableValue(value.into())),
                _ => Ok(()),
            }
        }
    }

    async fn run(validator: Validator, value: FieldValue) -> Result<(), ValidationError> {
        validator.run(&value, &RejectBad).await
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn length_counts_characters() {
        let text = FieldValue::Text("héllo".into());
        assert!(run(Validator::MaxLength(5), text.clone()).await.is_ok());
        assert_eq!(
            run(Validator::MinLength(6), text).await,
            Err(ValidationError::MinLength { min: 6, actual: 5 })
        );
    }

    #[tokio::test]
    async fn items_count_list_entries() {
        let list = FieldValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(
            run(Validator::MaxItems(1), list.clone()).await,
            Err(ValidationError::MaxItems { max: 1, actual: 2 })
        );
        assert!(run(Validator::MinItems(2), list).await.is_ok());
    }

    #[tokio::test]
    async fn value_bounds_are_inclusive() {
        assert!(run(Validator::MinValue(5), FieldValue::Integer(5)).await.is_ok());
        assert!(run(Validator::MaxValue(5), FieldValue::Integer(5)).await.is_ok());
        assert_eq!(
            run(Validator::MinValue(5), FieldValue::Float(4.99)).await,
            Err(ValidationError::MinValue { min: 5 })
        );
        let money = FieldValue::Money(Money {
            amount: Decimal::from_str("100.01").unwrap(),
            currency: "KES".into(),
        });
        assert_eq!(
            run(Validator::MaxValue(100), money).await,
            Err(ValidationError::MaxValue { max: 100 })
        );
    }

    #[tokio::test]
    async fn date_range_is_inclusive_at_both_ends() {
        let v = Validator::DateRange {
            start: date(1980, 1, 1),
            end: date(2025, 12, 31),
        };
        assert!(run(v.clone(), FieldValue::Date(date(1980, 1, 1))).await.is_ok());
        assert!(run(v.clone(), FieldValue::Date(date(2025, 12, 31))).await.is_ok());
        assert!(run(v.clone(), FieldValue::Date(date(1979, 12, 31))).await.is_err());
        let range = FieldValue::DateRange {
            start: date(2000, 1, 1),
            end: date(2026, 1, 1),
        };
        assert_eq!(
            run(v, range).await.unwrap_err().to_string(),
            "Ensure date is between 1980-01-01 and 2025-12-31."
        );
    }

    #[tokio::test]
    async fn time_and_datetime_ranges_are_inclusive_at_both_ends() {
        let v = Validator::TimeRange {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        let at = |h, m, s| FieldValue::Time(NaiveTime::from_hms_opt(h, m, s).unwrap());
        assert!(run(v.clone(), at(8, 0, 0)).await.is_ok());
        assert!(run(v.clone(), at(18, 0, 0)).await.is_ok());
        assert!(run(v.clone(), at(7, 59, 59)).await.is_err());
        assert!(run(v, at(18, 0, 1)).await.is_err());

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let second = chrono::Duration::seconds(1);
        let v = Validator::DateTimeRange { start, end };
        assert!(run(v.clone(), FieldValue::DateTime(start)).await.is_ok());
        assert!(run(v.clone(), FieldValue::DateTime(end)).await.is_ok());
        assert!(run(v.clone(), FieldValue::DateTime(start - second)).await.is_err());
        assert!(run(v, FieldValue::DateTime(end + second)).await.is_err());
    }

    #[tokio::test]
    async fn external_outcomes_map_to_distinct_errors() {
        let v = Validator::External {
            kind: ExternalKind::Validation,
            url: "https://svc/validate".into(),
        };
        assert!(run(v.clone(), FieldValue::Text("GOOD".into())).await.is_ok());

        let rejected = run(v.clone(), FieldValue::Text("BAD".into())).await.unwrap_err();
        assert!(rejected.to_string().starts_with("Invalid value"));

        assert_eq!(
            run(v.clone(), FieldValue::Text("SLOW".into())).await,
            Err(ValidationError::ExternalTimeout {
                service: "validation"
            })
        );
        assert!(matches!(
            run(v.clone(), FieldValue::Text("DOWN".into())).await,
            Err(ValidationError::ExternalUnavailable { .. })
        ));

        let refused = run(v, FieldValue::Text("..".into())).await.unwrap_err();
        assert_eq!(
            refused.to_string(),
            "Invalid value: validation service cannot check this value."
        );
    }

    #[tokio::test]
    async fn external_checks_numbers_as_text() {
        let v = Validator::External {
            kind: ExternalKind::Evaluation,
            url: "https://svc/eval".into(),
        };
        assert!(run(v, FieldValue::Integer(42)).await.is_ok());
    }
}
