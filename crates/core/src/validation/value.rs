//! Submission input and evaluation output types.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Coerced values keyed by field name, in schema order.
pub type ValueMap = IndexMap<String, FieldValue>;

/// Error report keyed by field name, in schema order.
pub type ErrorMap = IndexMap<String, FieldErrors>;

/// Errors recorded for one field: a message list, or a nested report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Messages(Vec<String>),
    Nested(ErrorMap),
}

impl FieldErrors {
    /// The message list, if this is not a nested report.
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            FieldErrors::Messages(m) => Some(m),
            FieldErrors::Nested(_) => None,
        }
    }
}

/// A monetary amount with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("amount", &self.amount.to_string())?;
        map.serialize_entry("currency", &self.currency)?;
        map.end()
    }
}

/// Metadata of an uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: usize,
}

/// A raw submission: JSON values plus uploaded file parts.
///
/// File parts inside nested forms are keyed by their dotted path, e.g.
/// `"applicant.passport_scan"`.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub files: HashMap<String, UploadedFile>,
}

impl Submission {
    pub fn from_data(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data,
            files: HashMap::new(),
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An optional field that was not submitted.
    Empty,
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Money(Money),
    Date(NaiveDate),
    DateRange { start: NaiveDate, end: NaiveDate },
    DateTime(DateTime<Utc>),
    DateTimeRange { start: DateTime<Utc>, end: DateTime<Utc> },
    Time(NaiveTime),
    List(Vec<String>),
    File(UploadedFile),
    Nested(ValueMap),
}

impl FieldValue {
    /// The text handed to external checks and length validators.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Float(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_none(),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Float(n) => serializer.serialize_f64(*n),
            FieldValue::Money(m) => m.serialize(serializer),
            FieldValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            FieldValue::DateRange { start, end } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("start", &start.format("%Y-%m-%d").to_string())?;
                map.serialize_entry("end", &end.format("%Y-%m-%d").to_string())?;
                map.end()
            }
            FieldValue::DateTime(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FieldValue::DateTimeRange { start, end } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(
                    "start",
                    &start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                )?;
                map.serialize_entry("end", &end.to_rfc3339_opts(SecondsFormat::AutoSi, true))?;
                map.end()
            }
            FieldValue::Time(t) => serializer.collect_str(&t.format("%H:%M:%S")),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::File(file) => file.serialize(serializer),
            FieldValue::Nested(values) => values.serialize(serializer),
        }
    }
}
