// handlers/protected/appointments.rs - GET/POST /api/appointments

use axum::extract::State;

use crate::database::models::{Appointment, AppointmentListing, NewAppointment};
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{AppointmentRequest, Validate};
use crate::AppState;

/// GET /api/appointments - Admins see every appointment, patients their own
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<AppointmentListing> {
    let listing = if auth.user.is_admin() {
        AppointmentListing::All(state.storage.get_appointments().await?)
    } else {
        AppointmentListing::Own(state.storage.get_appointments_by_patient(auth.id()).await?)
    };
    Ok(ApiResponse::success(listing))
}

/// POST /api/appointments - Book an appointment, always created pending
///
/// Patients can only book for themselves: a supplied `patientId` is replaced
/// by the caller's id. Admins may book for anyone and default to themselves.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Appointment> {
    let request = AppointmentRequest::validate(body)?;

    let patient_id = match request.patient_id {
        Some(requested) if auth.user.is_admin() => requested,
        Some(requested) if requested != auth.id() => {
            tracing::debug!(
                "Patient {} booked with patientId {}, using own id",
                auth.id(),
                requested
            );
            auth.id()
        }
        _ => auth.id(),
    };

    let appointment = state
        .storage
        .create_appointment(NewAppointment {
            patient_id,
            doctor_id: request.doctor_id,
            date: request.date,
            reason: request.reason,
        })
        .await?;
    Ok(ApiResponse::created(appointment))
}
