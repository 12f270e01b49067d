//! Field type tags.
//!
//! Stored as short snake_case strings (`"date_range"`, `"kra_pin"`) and
//! parsed into [`FieldType`] once, when a schema is built. Everything that
//! behaves differently per type matches on this enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of field types a form binding may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Array,
    Checkbox,
    Country,
    County,
    Currency,
    Date,
    DateRange,
    DateTime,
    DateTimeRange,
    Dropdown,
    Email,
    File,
    Float,
    KraPin,
    NationalId,
    Nested,
    Number,
    Password,
    PhoneNumber,
    Radio,
    Text,
    Time,
    Url,
    Uuid,
}

impl FieldType {
    /// Every variant, in tag order.
    pub const ALL: [FieldType; 24] = [
        FieldType::Array,
        FieldType::Checkbox,
        FieldType::Country,
        FieldType::County,
        FieldType::Currency,
        FieldType::Date,
        FieldType::DateRange,
        FieldType::DateTime,
        FieldType::DateTimeRange,
        FieldType::Dropdown,
        FieldType::Email,
        FieldType::File,
        FieldType::Float,
        FieldType::KraPin,
        FieldType::NationalId,
        FieldType::Nested,
        FieldType::Number,
        FieldType::Password,
        FieldType::PhoneNumber,
        FieldType::Radio,
        FieldType::Text,
        FieldType::Time,
        FieldType::Url,
        FieldType::Uuid,
    ];

    /// The stored tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Array => "array",
            FieldType::Checkbox => "checkbox",
            FieldType::Country => "country",
            FieldType::County => "county",
            FieldType::Currency => "currency",
            FieldType::Date => "date",
            FieldType::DateRange => "date_range",
            FieldType::DateTime => "date_time",
            FieldType::DateTimeRange => "date_time_range",
            FieldType::Dropdown => "dropdown",
            FieldType::Email => "email",
            FieldType::File => "file",
            FieldType::Float => "float",
            FieldType::KraPin => "kra_pin",
            FieldType::NationalId => "national_id",
            FieldType::Nested => "nested",
            FieldType::Number => "number",
            FieldType::Password => "password",
            FieldType::PhoneNumber => "phone_number",
            FieldType::Radio => "radio",
            FieldType::Text => "text",
            FieldType::Time => "time",
            FieldType::Url => "url",
            FieldType::Uuid => "uuid",
        }
    }

    /// Choice types restrict values to the binding's `options`.
    pub fn is_choice(self) -> bool {
        matches!(self, FieldType::Dropdown | FieldType::Radio)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored tag names no known field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}
