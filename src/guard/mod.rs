//! Access gate for the protected area.
//!
//! The gate never admits nor redirects while the session is still
//! resolving; a placeholder is shown until one of the terminal states is
//! observed.

use crate::session::{SessionState, SessionStore};
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    ShowLoadingPlaceholder,
    RedirectToLogin,
    RenderProtectedContent,
}

pub fn evaluate(state: &SessionState) -> GuardDecision {
    match state {
        SessionState::Resolving => GuardDecision::ShowLoadingPlaceholder,
        SessionState::Unauthenticated => GuardDecision::RedirectToLogin,
        SessionState::Authenticated(_) => GuardDecision::RenderProtectedContent,
    }
}

/// Follows a session store and re-evaluates on every state change.
pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
}

impl RouteGuard {
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        Self { session }
    }

    pub fn observe<S: SessionStore>(store: &S) -> Self {
        Self::new(store.observe())
    }

    /// Decision for the latest observed state.
    pub fn decision(&mut self) -> GuardDecision {
        evaluate(&self.session.borrow_and_update())
    }

    /// Waits for the next state change. Intermediate states that were
    /// superseded before this call returns are skipped. Returns `None` once
    /// the store is gone.
    pub async fn next_decision(&mut self) -> Option<GuardDecision> {
        self.session.changed().await.ok()?;
        Some(self.decision())
    }

    /// Current decision followed by one per state change.
    pub fn into_stream(self) -> impl Stream<Item = GuardDecision> + Send + 'static {
        WatchStream::new(self.session).map(|state| evaluate(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::session::SessionLookupError;

    #[test]
    fn transition_table() {
        assert_eq!(
            evaluate(&SessionState::Resolving),
            GuardDecision::ShowLoadingPlaceholder
        );
        assert_eq!(
            evaluate(&SessionState::Unauthenticated),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            evaluate(&SessionState::Authenticated(User::new("u-1"))),
            GuardDecision::RenderProtectedContent
        );
    }

    #[test]
    fn store_failure_redirects() {
        let state = SessionState::from_lookup(Err(SessionLookupError::Unreachable(
            anyhow::anyhow!("connection refused"),
        )));
        assert_eq!(evaluate(&state), GuardDecision::RedirectToLogin);
    }

    #[tokio::test]
    async fn loading_precedes_any_terminal_decision() {
        let (tx, rx) = watch::channel(SessionState::Resolving);
        let mut guard = RouteGuard::new(rx);
        assert_eq!(guard.decision(), GuardDecision::ShowLoadingPlaceholder);

        tx.send(SessionState::Authenticated(User::new("u-1"))).unwrap();
        assert_eq!(
            guard.next_decision().await,
            Some(GuardDecision::RenderProtectedContent)
        );
    }

    #[tokio::test]
    async fn logout_revokes_access() {
        let (tx, rx) = watch::channel(SessionState::Authenticated(User::new("u-1")));
        let mut guard = RouteGuard::new(rx);
        assert_eq!(guard.decision(), GuardDecision::RenderProtectedContent);

        tx.send(SessionState::Unauthenticated).unwrap();
        assert_eq!(
            guard.next_decision().await,
            Some(GuardDecision::RedirectToLogin)
        );
    }

    #[tokio::test]
    async fn stale_states_are_never_reported() {
        let (tx, rx) = watch::channel(SessionState::Resolving);
        let mut guard = RouteGuard::new(rx);
        guard.decision();

        tx.send(SessionState::Authenticated(User::new("u-1"))).unwrap();
        tx.send(SessionState::Unauthenticated).unwrap();
        assert_eq!(
            guard.next_decision().await,
            Some(GuardDecision::RedirectToLogin)
        );
    }

    #[tokio::test]
    async fn ends_when_store_is_dropped() {
        let (tx, rx) = watch::channel(SessionState::Resolving);
        let mut guard = RouteGuard::new(rx);
        drop(tx);
        assert_eq!(guard.next_decision().await, None);
    }

    #[tokio::test]
    async fn stream_starts_with_current_decision() {
        let (tx, rx) = watch::channel(SessionState::Resolving);
        let stream = RouteGuard::new(rx).into_stream();
        tokio::pin!(stream);
        assert_eq!(
            stream.next().await,
            Some(GuardDecision::ShowLoadingPlaceholder)
        );
        tx.send(SessionState::Unauthenticated).unwrap();
        assert_eq!(stream.next().await, Some(GuardDecision::RedirectToLogin));
        drop(tx);
        assert_eq!(stream.next().await, None);
    }
}
