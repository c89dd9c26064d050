// handlers/elevated/appointments.rs - PATCH /api/appointments/:id/status

use axum::extract::{Path, State};

use crate::database::models::{Appointment, Role};
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{require_role, ApiResponse, ApiResult, AuthUser};
use crate::validation::{StatusUpdate, Validate};
use crate::AppState;

/// PATCH /api/appointments/:id/status - Move an appointment to a new status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Appointment> {
    require_role(&auth, Role::Admin)?;
    let update = StatusUpdate::validate(body)?;
    let id: i32 = id.parse().map_err(|_| ApiError::not_found())?;

    match state.storage.update_appointment_status(id, update.status).await? {
        Some(appointment) => {
            tracing::info!("Appointment {} is now {}", id, appointment.status);
            Ok(ApiResponse::success(appointment))
        }
        None => Err(ApiError::not_found()),
    }
}
