// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no session) → Protected (any session) → Elevated (admin session)
//
// Every handler follows the same order: authenticate, authorize, validate,
// one gateway call, respond.
pub mod elevated;
pub mod protected;
pub mod public;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;

/// Raw JSON request body. Malformed JSON answers 400 in the API error shape;
/// typing happens later through [`crate::validation::Validate`].
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection);
    ApiError::invalid_json(rejection.body_text())
}
