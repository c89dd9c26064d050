// handlers/protected/reports.rs - GET /api/reports

use axum::extract::State;

use crate::database::models::Report;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

/// GET /api/reports - The caller's own reports, admins included
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Report>> {
    let reports = state.storage.get_reports_by_patient(auth.id()).await?;
    Ok(ApiResponse::success(reports))
}
