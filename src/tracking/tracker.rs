use super::{FingerprintRecorder, RecordError};
use crate::fingerprint::{self, Environment};
use crate::session::{SessionLookupError, SessionStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    Recorded { fingerprint_id: String },
    NoActiveUser,
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Failed to resolve the current user")]
    Session(#[from] SessionLookupError),
    #[error("Failed to record the device")]
    Record(#[from] RecordError),
}

/// Records the current device for the signed-in user, once per application
/// instance.
pub struct DeviceTracker<S, R> {
    store: Arc<S>,
    recorder: Arc<R>,
    environment: Environment,
    started: AtomicBool,
}

impl<S, R> DeviceTracker<S, R>
where
    S: SessionStore,
    R: FingerprintRecorder,
{
    pub fn new(store: Arc<S>, recorder: Arc<R>, environment: Environment) -> Self {
        Self {
            store,
            recorder,
            environment,
            started: AtomicBool::new(false),
        }
    }

    /// Starts tracking in a detached task. Only the first call does anything;
    /// failures are logged and never reach the caller.
    ///
    /// Outside a Tokio runtime nothing is started and a later call may retry.
    pub fn track(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Device tracking needs a Tokio runtime, skipped");
            return;
        };
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::debug!("Device tracking already started for this instance");
            return;
        }
        let store = self.store.clone();
        let recorder = self.recorder.clone();
        let environment = self.environment.clone();
        // detached: the JoinHandle is dropped
        drop(runtime.spawn(async move {
            match track_once(store.as_ref(), recorder.as_ref(), &environment).await {
                Ok(TrackOutcome::Recorded { fingerprint_id }) => {
                    tracing::info!("Device {fingerprint_id} recorded");
                }
                Ok(TrackOutcome::NoActiveUser) => {
                    tracing::debug!("No active user, device tracking skipped");
                }
                Err(err) => {
                    let err = anyhow::Error::from(err);
                    tracing::warn!("Device tracking failed: {err}");
                    err.chain()
                        .skip(1)
                        .for_each(|cause| tracing::warn!("Because: {cause}"));
                }
            }
        }));
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// One tracking pass, without the once-only guard.
    pub async fn run(&self) -> Result<TrackOutcome, TrackError> {
        track_once(self.store.as_ref(), self.recorder.as_ref(), &self.environment).await
    }
}

async fn track_once<S, R>(
    store: &S,
    recorder: &R,
    environment: &Environment,
) -> Result<TrackOutcome, TrackError>
where
    S: SessionStore,
    R: FingerprintRecorder,
{
    let Some(user) = store.current_user().await? else {
        return Ok(TrackOutcome::NoActiveUser);
    };
    let fingerprint = fingerprint::generate(environment);
    recorder.record(&user.id, &fingerprint).await?;
    Ok(TrackOutcome::Recorded {
        fingerprint_id: fingerprint.fingerprint_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceFingerprint, User};
    use crate::session::SessionState;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::{mpsc, watch};

    struct FixedSession {
        result: Mutex<Option<Result<Option<User>, SessionLookupError>>>,
        state: watch::Sender<SessionState>,
    }

    impl FixedSession {
        fn new(result: Result<Option<User>, SessionLookupError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                state: watch::channel(SessionState::Resolving).0,
            })
        }
    }

    impl SessionStore for FixedSession {
        async fn current_user(&self) -> Result<Option<User>, SessionLookupError> {
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(None))
        }
        fn observe(&self) -> watch::Receiver<SessionState> {
            self.state.subscribe()
        }
    }

    struct ChannelRecorder {
        tx: mpsc::UnboundedSender<(String, DeviceFingerprint)>,
        fail: bool,
    }

    impl FingerprintRecorder for ChannelRecorder {
        async fn record(
            &self,
            user_id: &str,
            fingerprint: &DeviceFingerprint,
        ) -> Result<(), RecordError> {
            self.tx
                .send((user_id.to_string(), fingerprint.clone()))
                .unwrap();
            if self.fail {
                Err(RecordError::Rejected("permission denied".to_string()))
            } else {
                Ok(())
            }
        }
    }

    type Recorded = mpsc::UnboundedReceiver<(String, DeviceFingerprint)>;

    fn channel_recorder(fail: bool) -> (Arc<ChannelRecorder>, Recorded) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelRecorder { tx, fail }), rx)
    }

    fn environment() -> Environment {
        Environment::from_signals([("screen", "390x844"), ("locale", "en-US")])
    }

    #[tokio::test]
    async fn records_the_signed_in_user() {
        let (recorder, mut rx) = channel_recorder(false);
        let tracker = DeviceTracker::new(
            FixedSession::new(Ok(Some(User::new("u-1")))),
            recorder,
            environment(),
        );
        let expected = fingerprint::generate(&environment()).fingerprint_id;
        assert_eq!(
            tracker.run().await.unwrap(),
            TrackOutcome::Recorded {
                fingerprint_id: expected.clone()
            }
        );
        let (user_id, fingerprint) = rx.recv().await.unwrap();
        assert_eq!(user_id, "u-1");
        assert_eq!(fingerprint.fingerprint_id, expected);
    }

    #[tokio::test]
    async fn nobody_signed_in_writes_nothing() {
        let (recorder, mut rx) = channel_recorder(false);
        let tracker = DeviceTracker::new(FixedSession::new(Ok(None)), recorder, environment());
        assert_eq!(tracker.run().await.unwrap(), TrackOutcome::NoActiveUser);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn lookup_and_record_failures_are_reported() {
        let (recorder, _rx) = channel_recorder(false);
        let tracker = DeviceTracker::new(
            FixedSession::new(Err(SessionLookupError::Rejected { status: 503 })),
            recorder,
            environment(),
        );
        assert!(matches!(tracker.run().await, Err(TrackError::Session(_))));

        let (recorder, _rx) = channel_recorder(true);
        let tracker = DeviceTracker::new(
            FixedSession::new(Ok(Some(User::new("u-1")))),
            recorder,
            environment(),
        );
        assert!(matches!(tracker.run().await, Err(TrackError::Record(_))));
    }

    #[tokio::test]
    async fn track_runs_once_per_instance() {
        let (recorder, mut rx) = channel_recorder(false);
        let tracker = DeviceTracker::new(
            FixedSession::new(Ok(Some(User::new("u-1")))),
            recorder,
            environment(),
        );
        assert!(!tracker.is_started());
        tracker.track();
        tracker.track();
        assert!(tracker.is_started());

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(first.is_some());
        let second = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(second.is_err(), "tracking ran twice");
    }

    #[test]
    fn track_outside_a_runtime_is_skipped() {
        let (recorder, mut rx) = channel_recorder(false);
        let tracker = DeviceTracker::new(
            FixedSession::new(Ok(Some(User::new("u-1")))),
            recorder,
            environment(),
        );
        tracker.track();
        assert!(!tracker.is_started());
        assert!(rx.try_recv().is_err());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            tracker.track();
            assert!(tracker.is_started());
            let attempt = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap();
            assert!(attempt.is_some());
        });
    }

    #[tokio::test]
    async fn track_swallows_failures() {
        let (recorder, mut rx) = channel_recorder(true);
        let tracker = DeviceTracker::new(
            FixedSession::new(Ok(Some(User::new("u-1")))),
            recorder,
            environment(),
        );
        tracker.track();
        let attempt = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(attempt.is_some());
    }
}
