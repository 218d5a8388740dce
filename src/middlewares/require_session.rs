use crate::guard::{self, GuardDecision};
use crate::session::SessionState;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

/// Gates the protected router on the request's bearer session.
///
/// The session is resolved before the decision is taken, so the loading
/// branch can only be reached by a state that never resolved; it is answered
/// with `503` rather than with content or a redirect.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = SessionState::from_lookup(state.keys.resolve(req.headers()));
    match guard::evaluate(&session) {
        GuardDecision::RenderProtectedContent => {
            if let SessionState::Authenticated(user) = session {
                tracing::trace!("Admitted {} to {}", user.id, req.uri().path());
                req.extensions_mut().insert(user);
            }
            next.run(req).await
        }
        GuardDecision::RedirectToLogin => {
            tracing::debug!("No session for {}, redirecting to login", req.uri().path());
            Redirect::to(&state.login_path).into_response()
        }
        GuardDecision::ShowLoadingPlaceholder => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
