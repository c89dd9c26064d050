// handlers/public/doctors.rs - GET /api/doctors, GET /api/doctors/:id

use axum::extract::{Path, State};

use crate::database::models::Doctor;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /api/doctors - The full doctor directory
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Doctor>> {
    let doctors = state.storage.get_doctors().await?;
    Ok(ApiResponse::success(doctors))
}

/// GET /api/doctors/:id - One doctor; unknown or non-numeric ids are 404
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Doctor> {
    let id: i32 = id.parse().map_err(|_| ApiError::not_found())?;
    match state.storage.get_doctor(id).await? {
        Some(doctor) => Ok(ApiResponse::success(doctor)),
        None => Err(ApiError::not_found()),
    }
}
