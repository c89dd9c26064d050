//! Validation layer: the single gate between untrusted JSON and the gateway.
//!
//! Each insertable type implements [`Validate`], turning a `serde_json::Value`
//! into a typed value or a [`ValidationError`] naming every offending field.

mod input;
pub mod requests;

use std::collections::BTreeMap;

use serde_json::Value;

pub use input::Input;
pub use requests::{AppointmentRequest, LoginRequest, StatusUpdate};

/// Structured validation failure, field name -> problem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn with_fields(field_errors: BTreeMap<String, String>) -> Self {
        let message = match field_errors.len() {
            1 => "Invalid field".to_string(),
            n => format!("{} invalid fields", n),
        };
        Self {
            message,
            field_errors,
        }
    }

    /// First offending field, if the failure is field-specific
    pub fn field(&self) -> Option<&str> {
        self.field_errors.keys().next().map(String::as_str)
    }
}

/// Parse untrusted JSON into a typed, insertable value
pub trait Validate: Sized {
    fn validate(value: Value) -> Result<Self, ValidationError>;
}
