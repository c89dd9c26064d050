use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::{Doctor, UnknownVariant, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALLOWED: &'static str = "pending, confirmed, completed, cancelled";

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(UnknownVariant {
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Insertable appointment. There is no status here: new appointments are
/// always pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: DateTime<Utc>,
    pub reason: String,
}

/// Patient view: an appointment with its doctor embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentWithDoctor {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Doctor,
}

/// Admin view: an appointment with both its doctor and its patient embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentWithParties {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Doctor,
    pub patient: User,
}

/// `GET /api/appointments` body: admins get both parties, patients their doctor.
///
/// Deserializing picks the variant by row shape, so an empty list always
/// comes back as `All`. `ApiClient::appointments` chooses by role instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppointmentListing {
    All(Vec<AppointmentWithParties>),
    Own(Vec<AppointmentWithDoctor>),
}

impl AppointmentListing {
    pub fn appointments(&self) -> Vec<&Appointment> {
        match self {
            AppointmentListing::All(rows) => rows.iter().map(|r| &r.appointment).collect(),
            AppointmentListing::Own(rows) => rows.iter().map(|r| &r.appointment).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AppointmentListing::All(rows) => rows.len(),
            AppointmentListing::Own(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_appointment_flattens_into_one_object() {
        let now = Utc::now();
        let joined = AppointmentWithDoctor {
            appointment: Appointment {
                id: 7,
                patient_id: 2,
                doctor_id: 3,
                date: now,
                reason: "Checkup".into(),
                status: AppointmentStatus::Pending,
                created_at: now,
            },
            doctor: Doctor {
                id: 3,
                name: "Dr. Emily Wilson".into(),
                specialization: "Neurology".into(),
                bio: "".into(),
                image_url: "".into(),
                availability: "".into(),
                experience: 12,
                rating: "4.9".into(),
            },
        };

        let value = serde_json::to_value(&joined).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["patientId"], 2);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["doctor"]["name"], "Dr. Emily Wilson");

        let back: AppointmentWithDoctor = serde_json::from_value(value).unwrap();
        assert_eq!(back, joined);
    }
}
