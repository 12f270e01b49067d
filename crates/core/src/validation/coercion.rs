//! Raw value coercion, one function per field type family.
//!
//! Pure logic over `serde_json::Value`; never performs I/O.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use validator::{ValidateEmail, ValidateUrl};

use super::error::CoercionError;
use super::value::{FieldValue, Money, UploadedFile};
use crate::field_type::FieldType;
use crate::reference;

/// Money amounts keep at most this many decimal places.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Local subscriber numbers up to this many digits get the default
/// calling code prepended.
const MAX_LOCAL_PHONE_DIGITS: usize = 9;

static E164_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("valid regex"));

static KRA_PIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[AP]\d{9}[A-Z]$").expect("valid regex"));

static NATIONAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,12}$").expect("valid regex"));

/// Deployment-wide coercion defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionSettings {
    /// Currency applied to bare numeric currency input.
    pub default_currency: String,
    /// Country calling code (digits only) used to expand local phone numbers.
    pub default_calling_code: Option<String>,
}

impl Default for CoercionSettings {
    fn default() -> Self {
        Self {
            default_currency: "KES".to_string(),
            default_calling_code: Some("254".to_string()),
        }
    }
}

/// The raw input for one field.
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    Json(&'a Value),
    File(&'a UploadedFile),
}

/// Coerce a raw input into the typed value for `field_type`.
///
/// `options` is only consulted by choice types. Nested forms are evaluated
/// recursively by the evaluator and are rejected here.
pub fn coerce(
    field_type: FieldType,
    input: RawInput<'_>,
    options: &[String],
    settings: &CoercionSettings,
) -> Result<FieldValue, CoercionError> {
    let raw = match (field_type, input) {
        (FieldType::File, RawInput::File(file)) => return coerce_file(file),
        (FieldType::File, RawInput::Json(_)) => {
            return Err(CoercionError::Invalid { expected: "file" })
        }
        (_, RawInput::File(_)) => {
            return Err(CoercionError::Invalid {
                expected: "value",
            })
        }
        (_, RawInput::Json(raw)) => raw,
    };

    match field_type {
        FieldType::Text => scalar_text(raw)
            .map(|s| FieldValue::Text(s.trim().to_string()))
            .ok_or(CoercionError::Invalid { expected: "text" }),
        FieldType::Password => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            _ => Err(CoercionError::Invalid {
                expected: "password",
            }),
        },
        FieldType::Email => coerce_email(raw),
        FieldType::Url => coerce_url(raw),
        FieldType::Uuid => coerce_uuid(raw),
        FieldType::KraPin => coerce_identifier(raw, &KRA_PIN_RE, "KRA PIN"),
        FieldType::NationalId => coerce_identifier(raw, &NATIONAL_ID_RE, "national ID number"),
        FieldType::Checkbox => coerce_bool(raw),
        FieldType::Dropdown | FieldType::Radio => coerce_choice(raw, options),
        FieldType::Number => coerce_integer(raw),
        FieldType::Float => coerce_float(raw),
        FieldType::Currency => coerce_money(raw, settings).map(FieldValue::Money),
        FieldType::PhoneNumber => coerce_phone(raw, settings),
        FieldType::Country => as_str(raw)
            .and_then(reference::find_country)
            .map(|c| FieldValue::Text(c.to_string()))
            .ok_or(CoercionError::Invalid {
                expected: "country code",
            }),
        FieldType::County => as_str(raw)
            .and_then(reference::find_county)
            .map(|c| FieldValue::Text(c.to_string()))
            .ok_or(CoercionError::Invalid { expected: "county" }),
        FieldType::Date => as_str(raw)
            .and_then(parse_date)
            .map(FieldValue::Date)
            .ok_or(CoercionError::Invalid { expected: "date" }),
        FieldType::Time => as_str(raw)
            .and_then(parse_time)
            .map(FieldValue::Time)
            .ok_or(CoercionError::Invalid { expected: "time" }),
        FieldType::DateTime => as_str(raw)
            .and_then(parse_datetime)
            .map(FieldValue::DateTime)
            .ok_or(CoercionError::Invalid {
                expected: "date/time",
            }),
        FieldType::DateRange => {
            let (start, end) = range_pair(raw, parse_date).ok_or(CoercionError::Invalid {
                expected: "date range",
            })?;
            if start > end {
                return Err(CoercionError::ReversedRange);
            }
            Ok(FieldValue::DateRange { start, end })
        }
        FieldType::DateTimeRange => {
            let (start, end) = range_pair(raw, parse_datetime).ok_or(CoercionError::Invalid {
                expected: "date/time range",
            })?;
            if start > end {
                return Err(CoercionError::ReversedRange);
            }
            Ok(FieldValue::DateTimeRange { start, end })
        }
        FieldType::Array => coerce_array(raw),
        FieldType::File => Err(CoercionError::Invalid { expected: "file" }),
        FieldType::Nested => Err(CoercionError::Invalid {
            expected: "nested form",
        }),
    }
}

// ── Scalars ──────────────────────────────────────────────────────────

fn as_str(raw: &Value) -> Option<&str> {
    raw.as_str().map(str::trim)
}

/// Strings, numbers and booleans rendered as text.
fn scalar_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_email(raw: &Value) -> Result<FieldValue, CoercionError> {
    match as_str(raw) {
        Some(s) if s.validate_email() => Ok(FieldValue::Text(s.to_string())),
        _ => Err(CoercionError::Invalid {
            expected: "email address",
        }),
    }
}

fn coerce_url(raw: &Value) -> Result<FieldValue, CoercionError> {
    const SCHEMES: [&str; 4] = ["http://", "https://", "ftp://", "ftps://"];
    match as_str(raw) {
        Some(s)
            if SCHEMES.iter().any(|p| s.to_ascii_lowercase().starts_with(p))
                && s.validate_url() =>
        {
            Ok(FieldValue::Text(s.to_string()))
        }
        _ => Err(CoercionError::Invalid { expected: "URL" }),
    }
}

fn coerce_uuid(raw: &Value) -> Result<FieldValue, CoercionError> {
    as_str(raw)
        .and_then(|s| uuid::Uuid::parse_str(s).ok())
        .map(|u| FieldValue::Text(u.hyphenated().to_string()))
        .ok_or(CoercionError::Invalid { expected: "UUID" })
}

fn coerce_identifier(
    raw: &Value,
    pattern: &Regex,
    expected: &'static str,
) -> Result<FieldValue, CoercionError> {
    let text = match raw {
        Value::String(s) => s.trim().to_ascii_uppercase(),
        Value::Number(n) if n.is_u64() => n.to_string(),
        _ => return Err(CoercionError::Invalid { expected }),
    };
    if pattern.is_match(&text) {
        Ok(FieldValue::Text(text))
    } else {
        Err(CoercionError::Invalid { expected })
    }
}

fn coerce_bool(raw: &Value) -> Result<FieldValue, CoercionError> {
    let invalid = CoercionError::Invalid {
        expected: "true or false value",
    };
    match raw {
        Value::Bool(b) => Ok(FieldValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(FieldValue::Bool(false)),
            Some(1) => Ok(FieldValue::Bool(true)),
            _ => Err(invalid),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Ok(FieldValue::Bool(true)),
            "false" | "off" | "0" | "no" => Ok(FieldValue::Bool(false)),
            _ => Err(invalid),
        },
        _ => Err(invalid),
    }
}

fn coerce_choice(raw: &Value, options: &[String]) -> Result<FieldValue, CoercionError> {
    let value = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(CoercionError::InvalidChoice {
                value: other.to_string(),
            })
        }
    };
    if options.iter().any(|o| *o == value) {
        Ok(FieldValue::Text(value))
    } else {
        Err(CoercionError::InvalidChoice { value })
    }
}

fn coerce_integer(raw: &Value) -> Result<FieldValue, CoercionError> {
    let from_float = |f: f64| {
        (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
            .then_some(f as i64)
    };
    let parsed = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(from_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_float))
        }
        _ => None,
    };
    parsed
        .map(FieldValue::Integer)
        .ok_or(CoercionError::Invalid {
            expected: "whole number",
        })
}

fn coerce_float(raw: &Value) -> Result<FieldValue, CoercionError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
        .ok_or(CoercionError::Invalid { expected: "number" })
}

// ── Money ────────────────────────────────────────────────────────────

/// Coerce structured (`{amount, currency}`, `[amount, currency]`,
/// `"KES 10.50"`) or bare numeric input into [`Money`].
pub fn coerce_money(raw: &Value, settings: &CoercionSettings) -> Result<Money, CoercionError> {
    let invalid = CoercionError::Invalid { expected: "amount" };

    let (amount, currency) = match raw {
        Value::Object(map) => {
            let amount = map.get("amount").ok_or(invalid.clone())?;
            let currency = map
                .get("currency")
                .and_then(Value::as_str)
                .ok_or(CoercionError::Invalid {
                    expected: "currency",
                })?;
            (parse_amount(amount)?, currency.to_string())
        }
        Value::Array(parts) if parts.len() == 2 => {
            let currency = parts[1].as_str().ok_or(CoercionError::Invalid {
                expected: "currency",
            })?;
            (parse_amount(&parts[0])?, currency.to_string())
        }
        Value::Number(_) => (parse_amount(raw)?, settings.default_currency.clone()),
        Value::String(s) => {
            let tokens: Vec<&str> = s.split_whitespace().collect();
            match tokens.as_slice() {
                [amount] => (
                    parse_amount_str(amount)?,
                    settings.default_currency.clone(),
                ),
                [a, b] if looks_like_code(a) => (parse_amount_str(b)?, a.to_string()),
                [a, b] if looks_like_code(b) => (parse_amount_str(a)?, b.to_string()),
                _ => return Err(invalid),
            }
        }
        _ => return Err(invalid),
    };

    let code = reference::find_currency(&currency).ok_or(CoercionError::UnknownCurrency {
        code: currency.clone(),
    })?;

    Ok(Money {
        amount,
        currency: code.to_string(),
    })
}

fn looks_like_code(token: &str) -> bool {
    token.len() == 3 && token.chars().all(|c| c.is_ascii_alphabetic())
}

fn parse_amount(raw: &Value) -> Result<Decimal, CoercionError> {
    match raw {
        Value::Number(n) => parse_amount_str(&n.to_string()),
        Value::String(s) => parse_amount_str(s),
        _ => Err(CoercionError::Invalid { expected: "amount" }),
    }
}

fn parse_amount_str(s: &str) -> Result<Decimal, CoercionError> {
    let mut amount = Decimal::from_str(s.trim())
        .map_err(|_| CoercionError::Invalid { expected: "amount" })?;
    if amount.normalize().scale() > MONEY_DECIMAL_PLACES {
        return Err(CoercionError::TooManyDecimalPlaces {
            max: MONEY_DECIMAL_PLACES,
        });
    }
    amount.rescale(MONEY_DECIMAL_PLACES);
    Ok(amount)
}

// ── Phone numbers ────────────────────────────────────────────────────

/// Normalize a phone number to E.164 (`+<country code><subscriber>`).
///
/// Accepts `+`-prefixed numbers, the `00` international prefix, national
/// numbers with a trunk `0` (expanded with the default calling code) and
/// bare integers.
fn coerce_phone(raw: &Value, settings: &CoercionSettings) -> Result<FieldValue, CoercionError> {
    let invalid = CoercionError::Invalid {
        expected: "phone number",
    };
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.is_u64() => n.to_string(),
        _ => return Err(invalid),
    };

    let (plus, rest) = match text.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let mut digits = String::with_capacity(rest.len());
    for ch in rest.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(invalid),
        }
    }

    let calling_code = settings.default_calling_code.as_deref();
    let normalized = if plus {
        format!("+{digits}")
    } else if let Some(intl) = digits.strip_prefix("00") {
        format!("+{intl}")
    } else if let (Some(national), Some(cc)) = (digits.strip_prefix('0'), calling_code) {
        format!("+{cc}{national}")
    } else if let Some(cc) = calling_code.filter(|_| digits.len() <= MAX_LOCAL_PHONE_DIGITS) {
        format!("+{cc}{digits}")
    } else {
        format!("+{digits}")
    };

    if E164_RE.is_match(&normalized) {
        Ok(FieldValue::Text(normalized))
    } else {
        Err(invalid)
    }
}

// ── Dates and times ──────────────────────────────────────────────────

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse an ISO 8601 date-time and normalize it to UTC.
///
/// Accepts `T` or a space between date and time. Values without an offset
/// are taken to be UTC already.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let normalized = match s.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &s[..10], &s[11..]),
        _ => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Extract `(start, end)` from `{start, end}`, `[start, end]` or `"start,end"`.
fn range_pair<T>(raw: &Value, parse: fn(&str) -> Option<T>) -> Option<(T, T)> {
    match raw {
        Value::Object(map) => {
            let start = map.get("start")?.as_str()?;
            let end = map.get("end")?.as_str()?;
            Some((parse(start)?, parse(end)?))
        }
        Value::Array(parts) if parts.len() == 2 => {
            Some((parse(parts[0].as_str()?)?, parse(parts[1].as_str()?)?))
        }
        Value::String(s) => {
            let (start, end) = s.split_once(',')?;
            Some((parse(start)?, parse(end)?))
        }
        _ => None,
    }
}

// ── Arrays and files ─────────────────────────────────────────────────

/// Split delimiter-separated input (or accept a pre-split sequence) and run
/// the element base check on every item, reporting every rejected item.
fn coerce_array(raw: &Value) -> Result<FieldValue, CoercionError> {
    let items: Vec<Option<String>> = match raw {
        Value::String(s) => s.split(',').map(|p| Some(p.trim().to_string())).collect(),
        Value::Array(values) => values
            .iter()
            .map(|v| scalar_text(v).map(|s| s.trim().to_string()))
            .collect(),
        _ => return Err(CoercionError::Invalid { expected: "list" }),
    };

    let mut values = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let position = index + 1;
        match item {
            Some(s) if !s.is_empty() => values.push(s),
            Some(_) => errors.push(format!(
                "Item {position} in the array did not validate: This field cannot be blank."
            )),
            None => errors.push(format!(
                "Item {position} in the array did not validate: Enter a valid value."
            )),
        }
    }

    if errors.is_empty() {
        Ok(FieldValue::List(values))
    } else {
        Err(CoercionError::InvalidItems(errors))
    }
}

fn coerce_file(file: &UploadedFile) -> Result<FieldValue, CoercionError> {
    if file.size == 0 {
        return Err(CoercionError::EmptyFile);
    }
    Ok(FieldValue::File(file.clone()))
}
