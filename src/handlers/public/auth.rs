// handlers/public/auth.rs - POST /api/register, /api/login, /api/logout

use axum::{extract::State, http::HeaderMap};

use crate::auth::{check_credentials, extract_token, hash_password_blocking};
use crate::database::models::{NewUser, Role, User};
use crate::database::StorageError;
use crate::error::ApiError;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{LoginRequest, Validate};
use crate::AppState;

/// POST /api/register - Create an account and log it in
///
/// `role: "admin"` is only honoured when admin self-registration is enabled;
/// otherwise the account is created as a patient.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<User> {
    let mut new_user = NewUser::validate(body)?;

    if new_user.role == Role::Admin && !state.config.security.allow_admin_registration {
        tracing::warn!(
            "Admin self-registration disabled, creating '{}' as patient",
            new_user.username
        );
        new_user.role = Role::Patient;
    }
    new_user.password = hash_password_blocking(std::mem::take(&mut new_user.password)).await?;

    let user = state
        .storage
        .create_user(new_user)
        .await
        .map_err(|e| match e {
            StorageError::Conflict(_) => ApiError::conflict("Username already exists"),
            other => other.into(),
        })?;

    let issued = state.sessions.establish(&user).await?;
    tracing::info!("Registered user {} ({})", user.id, user.role);

    let cookie = state.sessions.session_cookie(&issued);
    Ok(ApiResponse::created(user).with_cookie(cookie))
}

/// POST /api/login - Exchange username and password for a session
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<User> {
    let credentials = LoginRequest::validate(body)?;

    let user = state
        .storage
        .get_user_by_username(&credentials.username)
        .await?;
    let stored = user.as_ref().map(|user| user.password.clone());
    let matched = check_credentials(credentials.password, stored).await?;

    let user = match user {
        Some(user) if matched => user,
        _ => {
            tracing::warn!("Failed login for '{}'", credentials.username);
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    let issued = state.sessions.establish(&user).await?;
    let cookie = state.sessions.session_cookie(&issued);
    Ok(ApiResponse::success(user).with_cookie(cookie))
}

/// POST /api/logout - Destroy the caller's session, if any
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    if let Some(token) = extract_token(&headers) {
        state.sessions.revoke(&token).await?;
    }
    Ok(ApiResponse::empty().with_cookie(Some(state.sessions.clear_cookie())))
}
