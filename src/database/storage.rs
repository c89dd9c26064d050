use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Appointment, AppointmentStatus, AppointmentWithDoctor, AppointmentWithParties, Doctor,
    NewAppointment, NewDoctor, NewReport, NewUser, Report, Session, User,
};

/// Errors surfaced by a storage gateway
#[derive(Debug, Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The only component allowed to touch the persistent store.
///
/// One method per access pattern. Reads that embed related rows are joined
/// here so callers never receive bare foreign keys.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    // Doctors
    async fn get_doctors(&self) -> Result<Vec<Doctor>, StorageError>;
    async fn get_doctor(&self, id: i32) -> Result<Option<Doctor>, StorageError>;
    async fn create_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StorageError>;

    // Appointments, newest date first
    async fn get_appointments(&self) -> Result<Vec<AppointmentWithParties>, StorageError>;
    async fn get_appointments_by_patient(
        &self,
        patient_id: i32,
    ) -> Result<Vec<AppointmentWithDoctor>, StorageError>;
    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StorageError>;
    /// `Ok(None)` means there is no appointment with this id
    async fn update_appointment_status(
        &self,
        id: i32,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, StorageError>;

    // Reports
    async fn get_reports_by_patient(&self, patient_id: i32) -> Result<Vec<Report>, StorageError>;
    async fn create_report(&self, report: NewReport) -> Result<Report, StorageError>;

    /// Cheap round trip used by `/health`
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Server-side session rows backing the session cookie
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StorageError>;
    /// Expired sessions are reported as absent
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StorageError>;
    async fn delete_session(&self, id: Uuid) -> Result<(), StorageError>;
}
