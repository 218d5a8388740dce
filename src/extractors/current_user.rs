use crate::common::AppError;
use crate::models::User;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// User admitted by the session guard for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}
