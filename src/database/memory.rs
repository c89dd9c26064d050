use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Appointment, AppointmentStatus, AppointmentWithDoctor, AppointmentWithParties, Doctor,
    NewAppointment, NewDoctor, NewReport, NewUser, Report, Session, User,
};
use super::storage::{SessionStore, Storage, StorageError};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    doctors: BTreeMap<i32, Doctor>,
    appointments: BTreeMap<i32, Appointment>,
    reports: BTreeMap<i32, Report>,
    sessions: HashMap<Uuid, Session>,
    // Serial counters, one per table, starting at 1 like SERIAL columns
    next_user_id: i32,
    next_doctor_id: i32,
    next_appointment_id: i32,
    next_report_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// In-process storage gateway.
///
/// Enforces the same uniqueness and foreign-key rules as the Postgres schema,
/// checked under the write lock so concurrent requests cannot race past them.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict("users_username_key".to_string()));
        }

        let id = next_id(&mut tables.next_user_id);
        let created = User {
            id,
            username: user.username,
            password: user.password,
            role: user.role,
            name: user.name,
            email: user.email,
            mobile: user.mobile,
            created_at: Utc::now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_doctors(&self) -> Result<Vec<Doctor>, StorageError> {
        Ok(self.tables.read().await.doctors.values().cloned().collect())
    }

    async fn get_doctor(&self, id: i32) -> Result<Option<Doctor>, StorageError> {
        Ok(self.tables.read().await.doctors.get(&id).cloned())
    }

    async fn create_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StorageError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_doctor_id);
        let created = doctor.into_doctor(id);
        tables.doctors.insert(id, created.clone());
        Ok(created)
    }

    async fn get_appointments(&self) -> Result<Vec<AppointmentWithParties>, StorageError> {
        let tables = self.tables.read().await;
        let mut joined: Vec<AppointmentWithParties> = tables
            .appointments
            .values()
            .filter_map(|a| {
                // Inner join: rows without both parties are skipped
                let doctor = tables.doctors.get(&a.doctor_id)?;
                let patient = tables.users.get(&a.patient_id)?;
                Some(AppointmentWithParties {
                    appointment: a.clone(),
                    doctor: doctor.clone(),
                    patient: patient.clone(),
                })
            })
            .collect();
        joined.sort_by(|a, b| b.appointment.date.cmp(&a.appointment.date));
        Ok(joined)
    }

    async fn get_appointments_by_patient(
        &self,
        patient_id: i32,
    ) -> Result<Vec<AppointmentWithDoctor>, StorageError> {
        let tables = self.tables.read().await;
        let mut joined: Vec<AppointmentWithDoctor> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .filter_map(|a| {
                let doctor = tables.doctors.get(&a.doctor_id)?;
                Some(AppointmentWithDoctor {
                    appointment: a.clone(),
                    doctor: doctor.clone(),
                })
            })
            .collect();
        joined.sort_by(|a, b| b.appointment.date.cmp(&a.appointment.date));
        Ok(joined)
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&appointment.patient_id) {
            return Err(StorageError::MissingReference(
                "appointments_patient_id_fkey".to_string(),
            ));
        }
        if !tables.doctors.contains_key(&appointment.doctor_id) {
            return Err(StorageError::MissingReference(
                "appointments_doctor_id_fkey".to_string(),
            ));
        }

        let id = next_id(&mut tables.next_appointment_id);
        let created = Appointment {
            id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            reason: appointment.reason,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        };
        tables.appointments.insert(id, created.clone());
        Ok(created)
    }

    async fn update_appointment_status(
        &self,
        id: i32,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, StorageError> {
        let mut tables = self.tables.write().await;
        Ok(tables.appointments.get_mut(&id).map(|a| {
            a.status = status;
            a.clone()
        }))
    }

    async fn get_reports_by_patient(&self, patient_id: i32) -> Result<Vec<Report>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reports
            .values()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn create_report(&self, report: NewReport) -> Result<Report, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&report.patient_id) {
            return Err(StorageError::MissingReference(
                "reports_patient_id_fkey".to_string(),
            ));
        }

        let id = next_id(&mut tables.next_report_id);
        let created = Report {
            id,
            patient_id: report.patient_id,
            title: report.title,
            file_url: report.file_url,
            report_type: report.report_type,
            date: Utc::now(),
        };
        tables.reports.insert(id, created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn create_session(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StorageError::MissingReference(
                "sessions_user_id_fkey".to_string(),
            ));
        }

        let now = Utc::now();
        tables.sessions.retain(|_, s| !s.is_expired(now));

        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .get(&id)
            .filter(|s| !s.is_expired(Utc::now()))
            .cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), StorageError> {
        self.tables.write().await.sessions.remove(&id);
        Ok(())
    }
}
