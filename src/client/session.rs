use crate::models::User;
use crate::session::{SessionLookupError, SessionState, SessionStore};
use reqwest::StatusCode;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tokio::sync::watch;

struct Inner {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    state: watch::Sender<SessionState>,
}

/// Session store backed by the server's `/api/session` endpoint.
///
/// Cheap to clone; clones share the token and the state channel.
#[derive(Clone)]
pub struct RemoteSessionStore {
    inner: Arc<Inner>,
}

impl RemoteSessionStore {
    /// Creates a signed-out store; call [`sign_in`](Self::sign_in) with a
    /// persisted token to restore a session.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                token: RwLock::new(None),
                state,
            }),
        })
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    pub(super) fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn token_slot(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.inner
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the token and publishes `state` as one step, so a lookup that
    /// finishes concurrently cannot slip in between.
    fn publish(&self, token: Option<String>, state: SessionState) {
        let mut slot = self.token_slot();
        *slot = token;
        self.inner.state.send_replace(state);
    }

    /// Adopts a persisted or freshly issued token and resolves it.
    pub async fn sign_in(&self, token: impl Into<String>) -> SessionState {
        self.publish(Some(token.into()), SessionState::Resolving);
        self.refresh().await
    }

    /// Drops the token; observers see `Unauthenticated` right away.
    pub fn sign_out(&self) {
        self.publish(None, SessionState::Unauthenticated);
    }

    /// Re-resolves the current token and publishes the outcome.
    pub async fn refresh(&self) -> SessionState {
        let token = self.token();
        let state = SessionState::from_lookup(self.lookup(token.clone()).await);
        let slot = self.token_slot();
        // a sign-in or sign-out that raced this lookup wins
        if *slot != token {
            return self.inner.state.borrow().clone();
        }
        self.inner.state.send_replace(state.clone());
        drop(slot);
        state
    }

    async fn lookup(&self, token: Option<String>) -> Result<Option<User>, SessionLookupError> {
        let Some(token) = token else {
            return Ok(None);
        };
        let response = self
            .http()
            .get(self.url("/api/session"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| SessionLookupError::Unreachable(err.into()))?;
        let status = response.status();
        if status.is_redirection()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionLookupError::Rejected {
                status: status.as_u16(),
            });
        }
        let user = response
            .json::<User>()
            .await
            .map_err(|err| SessionLookupError::Unreachable(err.into()))?;
        Ok(Some(user))
    }
}

impl SessionStore for RemoteSessionStore {
    async fn current_user(&self) -> Result<Option<User>, SessionLookupError> {
        self.lookup(self.token()).await
    }

    fn observe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{GuardDecision, RouteGuard};
    use axum::extract::State;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    async fn slow_session(State(gate): State<Arc<Gate>>) -> Json<User> {
        gate.entered.notify_one();
        gate.release.notified().await;
        Json(User::new("u-1"))
    }

    async fn spawn_slow_backend() -> (String, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let app = Router::new()
            .route("/api/session", get(slow_session))
            .with_state(gate.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), gate)
    }

    #[tokio::test]
    async fn new_store_is_signed_out() {
        let store = RemoteSessionStore::new("http://127.0.0.1:9").unwrap();
        assert_eq!(*store.observe().borrow(), SessionState::Unauthenticated);
        assert_eq!(
            RouteGuard::observe(&store).decision(),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(store.current_user().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sign_out_during_lookup_stays_signed_out() {
        let (base_url, gate) = spawn_slow_backend().await;
        let store = RemoteSessionStore::new(base_url).unwrap();
        let mut guard = RouteGuard::observe(&store);

        let signing_in = tokio::spawn({
            let store = store.clone();
            async move { store.sign_in("token").await }
        });
        tokio::time::timeout(Duration::from_secs(5), gate.entered.notified())
            .await
            .unwrap();
        assert_eq!(guard.decision(), GuardDecision::ShowLoadingPlaceholder);

        store.sign_out();
        gate.release.notify_one();
        let settled = signing_in.await.unwrap();

        assert_eq!(settled, SessionState::Unauthenticated);
        assert_eq!(*store.observe().borrow(), SessionState::Unauthenticated);
        assert_eq!(store.token(), None);
        assert_eq!(guard.decision(), GuardDecision::RedirectToLogin);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completed_lookup_is_published() {
        let (base_url, gate) = spawn_slow_backend().await;
        let store = RemoteSessionStore::new(base_url).unwrap();
        gate.release.notify_one();
        assert_eq!(
            store.sign_in("token").await,
            SessionState::Authenticated(User::new("u-1"))
        );
        assert_eq!(
            RouteGuard::observe(&store).decision(),
            GuardDecision::RenderProtectedContent
        );
    }
}
