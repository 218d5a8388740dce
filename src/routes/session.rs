use crate::extractors::CurrentUser;
use crate::models::User;
use axum::Json;

/// Session of the caller; only reachable through the guard.
pub async fn current(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
