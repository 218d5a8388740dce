//! Contract of the external session store.

use crate::models::User;
use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;

/// Process-local view of the authentication status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Lookup in flight.
    Resolving,
    Authenticated(User),
    Unauthenticated,
}

impl SessionState {
    /// Folds a lookup result into a state. A failed lookup is treated as
    /// signed out.
    pub fn from_lookup(result: Result<Option<User>, SessionLookupError>) -> Self {
        match result {
            Ok(Some(user)) => SessionState::Authenticated(user),
            Ok(None) => SessionState::Unauthenticated,
            Err(err) => {
                tracing::warn!("Session lookup failed, treating as signed out: {err}");
                SessionState::Unauthenticated
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionLookupError {
    #[error("Session store unreachable")]
    Unreachable(#[source] anyhow::Error),
    #[error("Session store rejected the lookup with status {status}")]
    Rejected { status: u16 },
}

/// Authenticated-identity provider.
pub trait SessionStore: Send + Sync + 'static {
    /// Resolves the current user; `Ok(None)` means nobody is signed in.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, SessionLookupError>> + Send;

    /// Pushes every session state change, starting with the current one.
    fn observe(&self) -> watch::Receiver<SessionState>;
}
