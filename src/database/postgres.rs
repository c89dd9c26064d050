use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::models::{
    Appointment, AppointmentStatus, AppointmentWithDoctor, AppointmentWithParties, Doctor,
    NewAppointment, NewDoctor, NewReport, NewUser, Report, Session, User,
};
use super::storage::{SessionStore, Storage, StorageError};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const USER_COLUMNS: &str = "id, username, password, role, name, email, mobile, created_at";
const DOCTOR_COLUMNS: &str =
    "id, name, specialization, bio, image_url, availability, experience, rating";
const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, date, reason, status, created_at";
const REPORT_COLUMNS: &str = "id, patient_id, title, file_url, type, date";

/// Joined appointment select. Doctor and patient columns are prefixed so they
/// can be pulled back out of a single row.
const APPOINTMENT_JOIN_SELECT: &str = r#"
    SELECT
        a.id, a.patient_id, a.doctor_id, a.date, a.reason, a.status, a.created_at,
        d.id AS d_id, d.name AS d_name, d.specialization AS d_specialization,
        d.bio AS d_bio, d.image_url AS d_image_url, d.availability AS d_availability,
        d.experience AS d_experience, d.rating AS d_rating,
        u.id AS u_id, u.username AS u_username, u.password AS u_password,
        u.role AS u_role, u.name AS u_name, u.email AS u_email,
        u.mobile AS u_mobile, u.created_at AS u_created_at
    FROM appointments a
    INNER JOIN doctors d ON a.doctor_id = d.id
    INNER JOIN users u ON a.patient_id = u.id
"#;

/// Storage gateway over a Postgres pool
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate constraint violations into gateway errors, leave the rest as-is
fn map_write_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return StorageError::Conflict(
                    db_err.constraint().unwrap_or("unique constraint").to_string(),
                );
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return StorageError::MissingReference(
                    db_err.constraint().unwrap_or("foreign key").to_string(),
                );
            }
            _ => {}
        }
    }
    StorageError::Sqlx(err)
}

fn appointment_from_row(row: &PgRow) -> Result<Appointment, sqlx::Error> {
    Ok(Appointment {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        doctor_id: row.try_get("doctor_id")?,
        date: row.try_get("date")?,
        reason: row.try_get("reason")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn doctor_from_row(row: &PgRow) -> Result<Doctor, sqlx::Error> {
    Ok(Doctor {
        id: row.try_get("d_id")?,
        name: row.try_get("d_name")?,
        specialization: row.try_get("d_specialization")?,
        bio: row.try_get("d_bio")?,
        image_url: row.try_get("d_image_url")?,
        availability: row.try_get("d_availability")?,
        experience: row.try_get("d_experience")?,
        rating: row.try_get("d_rating")?,
    })
}

fn patient_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("u_id")?,
        username: row.try_get("u_username")?,
        password: row.try_get("u_password")?,
        role: row.try_get("u_role")?,
        name: row.try_get("u_name")?,
        email: row.try_get("u_email")?,
        mobile: row.try_get("u_mobile")?,
        created_at: row.try_get("u_created_at")?,
    })
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: i32) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let sql = format!(
            "INSERT INTO users (username, password, role, name, email, mobile) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password)
            .bind(user.role)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.mobile)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn get_doctors(&self) -> Result<Vec<Doctor>, StorageError> {
        let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id");
        let doctors = sqlx::query_as::<_, Doctor>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(doctors)
    }

    async fn get_doctor(&self, id: i32) -> Result<Option<Doctor>, StorageError> {
        let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = $1");
        let doctor = sqlx::query_as::<_, Doctor>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doctor)
    }

    async fn create_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StorageError> {
        let sql = format!(
            "INSERT INTO doctors (name, specialization, bio, image_url, availability, experience, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {DOCTOR_COLUMNS}"
        );
        sqlx::query_as::<_, Doctor>(&sql)
            .bind(&doctor.name)
            .bind(&doctor.specialization)
            .bind(&doctor.bio)
            .bind(&doctor.image_url)
            .bind(&doctor.availability)
            .bind(doctor.experience)
            .bind(&doctor.rating)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn get_appointments(&self) -> Result<Vec<AppointmentWithParties>, StorageError> {
        let sql = format!("{APPOINTMENT_JOIN_SELECT} ORDER BY a.date DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let appointments = rows
            .iter()
            .map(|row| {
                Ok(AppointmentWithParties {
                    appointment: appointment_from_row(row)?,
                    doctor: doctor_from_row(row)?,
                    patient: patient_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!("Loaded {} appointments", appointments.len());
        Ok(appointments)
    }

    async fn get_appointments_by_patient(
        &self,
        patient_id: i32,
    ) -> Result<Vec<AppointmentWithDoctor>, StorageError> {
        let sql = format!("{APPOINTMENT_JOIN_SELECT} WHERE a.patient_id = $1 ORDER BY a.date DESC");
        let rows = sqlx::query(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;

        let appointments = rows
            .iter()
            .map(|row| {
                Ok(AppointmentWithDoctor {
                    appointment: appointment_from_row(row)?,
                    doctor: doctor_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(appointments)
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StorageError> {
        let sql = format!(
            "INSERT INTO appointments (patient_id, doctor_id, date, reason, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {APPOINTMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(appointment.patient_id)
            .bind(appointment.doctor_id)
            .bind(appointment.date)
            .bind(&appointment.reason)
            .bind(AppointmentStatus::Pending)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn update_appointment_status(
        &self,
        id: i32,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, StorageError> {
        let sql = format!(
            "UPDATE appointments SET status = $1 WHERE id = $2 RETURNING {APPOINTMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Appointment>(&sql)
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn get_reports_by_patient(&self, patient_id: i32) -> Result<Vec<Report>, StorageError> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE patient_id = $1 ORDER BY id");
        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reports)
    }

    async fn create_report(&self, report: NewReport) -> Result<Report, StorageError> {
        let sql = format!(
            "INSERT INTO reports (patient_id, title, file_url, type) \
             VALUES ($1, $2, $3, $4) RETURNING {REPORT_COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&sql)
            .bind(report.patient_id)
            .bind(&report.title)
            .bind(&report.file_url)
            .bind(report.report_type)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStorage {
    async fn create_session(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }

        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, user_id, created_at, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StorageError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at, expires_at FROM sessions \
             WHERE id = $1 AND expires_at > now()",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
