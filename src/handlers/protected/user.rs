// handlers/protected/user.rs - GET /api/user

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/user - The current session's user
pub async fn current(auth: AuthUser) -> ApiResult<User> {
    Ok(ApiResponse::success(auth.user))
}
