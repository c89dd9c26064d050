use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Input, Validate, ValidationError};
use crate::database::models::doctor::DEFAULT_RATING;
use crate::database::models::{
    AppointmentStatus, NewDoctor, NewReport, NewUser, ReportType, Role,
};

const USER_SERVER_FIELDS: &[&str] = &["id", "createdAt"];
const DOCTOR_SERVER_FIELDS: &[&str] = &["id"];
const APPOINTMENT_SERVER_FIELDS: &[&str] = &["id", "createdAt", "status"];
const REPORT_SERVER_FIELDS: &[&str] = &["id", "date"];

fn incomplete() -> ValidationError {
    ValidationError::new("Incomplete input")
}

impl Validate for NewUser {
    fn validate(value: Value) -> Result<Self, ValidationError> {
        let mut input = Input::from_json(value, USER_SERVER_FIELDS)?;
        let fields = (
            input.required_non_blank("username"),
            input.required_non_blank("password"),
            input.optional_enum::<Role>("role"),
            input.required_str("name"),
            input.required_str("email"),
            input.optional_str("mobile"),
        );
        input.finish()?;

        match fields {
            (Some(username), Some(password), role, Some(name), Some(email), mobile) => Ok(NewUser {
                username,
                password,
                role: role.unwrap_or_default(),
                name,
                email,
                mobile,
            }),
            _ => Err(incomplete()),
        }
    }
}

impl Validate for NewDoctor {
    fn validate(value: Value) -> Result<Self, ValidationError> {
        let mut input = Input::from_json(value, DOCTOR_SERVER_FIELDS)?;
        let fields = (
            input.required_str("name"),
            input.required_str("specialization"),
            input.required_str("bio"),
            input.required_str("imageUrl"),
            input.required_str("availability"),
            input.optional_int("experience"),
            input.optional_decimal_text("rating"),
        );
        input.finish()?;

        match fields {
            (
                Some(name),
                Some(specialization),
                Some(bio),
                Some(image_url),
                Some(availability),
                experience,
                rating,
            ) => {
                let experience = experience.unwrap_or(0);
                if experience < 0 {
                    let mut errors = std::collections::BTreeMap::new();
                    errors.insert("experience".to_string(), "Must not be negative".to_string());
                    return Err(ValidationError::with_fields(errors));
                }
                Ok(NewDoctor {
                    name,
                    specialization,
                    bio,
                    image_url,
                    availability,
                    experience,
                    rating: rating.unwrap_or_else(|| DEFAULT_RATING.to_string()),
                })
            }
            _ => Err(incomplete()),
        }
    }
}

/// Booking payload. `patientId` is optional here because the route layer
/// decides whose appointment it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i32>,
    pub doctor_id: i32,
    pub date: DateTime<Utc>,
    pub reason: String,
}

impl Validate for AppointmentRequest {
    fn validate(value: Value) -> Result<Self, ValidationError> {
        let mut input = Input::from_json(value, APPOINTMENT_SERVER_FIELDS)?;
        let fields = (
            input.optional_int("patientId"),
            input.required_int("doctorId"),
            input.required_timestamp("date"),
            input.required_str("reason"),
        );
        input.finish()?;

        match fields {
            (patient_id, Some(doctor_id), Some(date), Some(reason)) => Ok(AppointmentRequest {
                patient_id,
                doctor_id,
                date,
                reason,
            }),
            _ => Err(incomplete()),
        }
    }
}

impl Validate for NewReport {
    fn validate(value: Value) -> Result<Self, ValidationError> {
        let mut input = Input::from_json(value, REPORT_SERVER_FIELDS)?;
        let fields = (
            input.required_int("patientId"),
            input.required_str("title"),
            input.required_str("fileUrl"),
            input.required_enum::<ReportType>("type"),
        );
        input.finish()?;

        match fields {
            (Some(patient_id), Some(title), Some(file_url), Some(report_type)) => Ok(NewReport {
                patient_id,
                title,
                file_url,
                report_type,
            }),
            _ => Err(incomplete()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(value: Value) -> Result<Self, ValidationError> {
        let mut input = Input::from_json(value, &[])?;
        let fields = (input.required_str("username"), input.required_str("password"));
        input.finish()?;

        match fields {
            (Some(username), Some(password)) => Ok(LoginRequest { username, password }),
            _ => Err(incomplete()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

impl Validate for StatusUpdate {
    fn validate(value: Value) -> Result<Self, ValidationError> {
        let mut input = Input::from_json(value, &[])?;
        let status = input.required_enum::<AppointmentStatus>("status");
        input.finish()?;
        status.map(|status| StatusUpdate { status }).ok_or_else(incomplete)
    }
}
