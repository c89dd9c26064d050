use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::ValidationError;
use crate::database::models::UnknownVariant;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A candidate JSON object being checked against an insertable shape.
///
/// Accessors record a field error instead of failing fast, so one pass
/// reports every problem. Call [`Input::finish`] once all fields are read.
#[derive(Debug)]
pub struct Input {
    fields: Map<String, Value>,
    errors: BTreeMap<String, String>,
}

impl Input {
    /// Wrap a JSON object, silently dropping server-assigned fields
    pub fn from_json(value: Value, server_fields: &[&str]) -> Result<Self, ValidationError> {
        match value {
            Value::Object(mut fields) => {
                for field in server_fields {
                    if fields.remove(*field).is_some() {
                        tracing::debug!("Ignoring server-assigned field '{}' in input", field);
                    }
                }
                Ok(Self {
                    fields,
                    errors: BTreeMap::new(),
                })
            }
            _ => Err(ValidationError::new("Expected JSON object")),
        }
    }

    fn present(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    fn missing(&mut self, field: &str) {
        self.fail(field, "This field is required");
    }

    pub fn required_str(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(field, "Expected a string");
                None
            }
            None => {
                self.missing(field);
                None
            }
        }
    }

    /// Like [`Input::required_str`] but blank strings are rejected too
    pub fn required_non_blank(&mut self, field: &str) -> Option<String> {
        let value = self.required_str(field)?;
        if value.trim().is_empty() {
            self.fail(field, "Must not be empty");
            return None;
        }
        Some(value)
    }

    pub fn optional_str(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(field, "Expected a string");
                None
            }
            None => None,
        }
    }

    /// Integer field; numeric strings are coerced
    pub fn required_int(&mut self, field: &str) -> Option<i32> {
        if self.present(field).is_none() {
            self.missing(field);
            return None;
        }
        self.optional_int(field)
    }

    pub fn optional_int(&mut self, field: &str) -> Option<i32> {
        let parsed = match self.present(field)? {
            Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.fail(field, "Expected an integer");
        }
        parsed
    }

    /// Timestamp field: RFC 3339, naive date-time (UTC) or a bare date
    pub fn required_timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let raw = match self.present(field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                let message = format!("Invalid timestamp format: {}", other);
                self.fail(field, message);
                return None;
            }
            None => {
                self.missing(field);
                return None;
            }
        };

        let parsed = parse_timestamp(raw.trim());
        if parsed.is_none() {
            self.fail(field, format!("Invalid timestamp format: {}", raw));
        }
        parsed
    }

    pub fn required_enum<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        if self.present(field).is_none() {
            self.missing(field);
            return None;
        }
        self.optional_enum(field)
    }

    pub fn optional_enum<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        let raw = match self.present(field)? {
            Value::String(s) => s.clone(),
            _ => {
                self.fail(field, "Expected a string");
                return None;
            }
        };
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.fail(field, format!("Must be one of: {}", e.allowed));
                None
            }
        }
    }

    /// Text-typed decimal, e.g. a rating. Numbers are accepted and kept as text.
    pub fn optional_decimal_text(&mut self, field: &str) -> Option<String> {
        let raw = match self.present(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.fail(field, "Expected a decimal");
                return None;
            }
        };
        if Decimal::from_str(&raw).is_err() {
            self.fail(field, format!("Invalid decimal: {}", raw));
            return None;
        }
        Some(raw)
    }

    /// Fail with every recorded field error, if any
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::with_fields(self.errors))
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
