// handlers/elevated/doctors.rs - POST /api/doctors

use axum::extract::State;

use crate::database::models::{Doctor, NewDoctor, Role};
use crate::handlers::JsonBody;
use crate::middleware::{require_role, ApiResponse, ApiResult, AuthUser};
use crate::validation::Validate;
use crate::AppState;

/// POST /api/doctors - Add a doctor profile
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Doctor> {
    require_role(&auth, Role::Admin)?;
    let new_doctor = NewDoctor::validate(body)?;

    let doctor = state.storage.create_doctor(new_doctor).await?;
    tracing::info!("Admin {} created doctor {}", auth.id(), doctor.id);
    Ok(ApiResponse::created(doctor))
}
