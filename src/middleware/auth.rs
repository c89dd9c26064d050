use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{extract_token, Claims};
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller, resolved from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
    pub token: String,
}

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Session middleware: resolves the caller (if any) and injects it into the request.
///
/// Anonymous requests pass through untouched; routes that need a caller use the
/// [`AuthUser`] extractor, which answers 401 when nothing was injected.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers()) {
        match state.sessions.verify(&token).await {
            Ok(Some((claims, user))) => {
                tracing::debug!("Authenticated user {} ({})", user.id, user.role);
                request.extensions_mut().insert(AuthUser { user, claims, token });
            }
            Ok(None) => {}
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

/// The single role predicate. An insufficient role answers 401.
pub fn require_role(auth: &AuthUser, role: Role) -> Result<(), ApiError> {
    if auth.role() == role {
        return Ok(());
    }
    tracing::warn!(
        "User {} with role {} denied, {} required",
        auth.id(),
        auth.role(),
        role
    );
    Err(ApiError::unauthorized("Not authorized"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn auth_user(role: Role) -> AuthUser {
        AuthUser {
            user: User {
                id: 7,
                username: "someone".into(),
                password: String::new(),
                role,
                name: "Some One".into(),
                email: "some@example.com".into(),
                mobile: None,
                created_at: Utc::now(),
            },
            claims: Claims {
                sub: "7".into(),
                sid: Uuid::new_v4(),
                role,
                exp: 0,
                iat: 0,
            },
            token: String::new(),
        }
    }

    #[test]
    fn require_role_matches_exactly() {
        assert!(require_role(&auth_user(Role::Admin), Role::Admin).is_ok());
        let err = require_role(&auth_user(Role::Patient), Role::Admin).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
