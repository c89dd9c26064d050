pub mod auth;
pub mod response;

pub use auth::{require_role, session_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
