// handlers/elevated/reports.rs - POST /api/reports

use axum::extract::State;

use crate::database::models::{NewReport, Report, Role};
use crate::handlers::JsonBody;
use crate::middleware::{require_role, ApiResponse, ApiResult, AuthUser};
use crate::validation::Validate;
use crate::AppState;

/// POST /api/reports - Attach a report to a patient (file is uploaded elsewhere)
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Report> {
    require_role(&auth, Role::Admin)?;
    let new_report = NewReport::validate(body)?;

    let report = state.storage.create_report(new_report).await?;
    Ok(ApiResponse::created(report))
}
