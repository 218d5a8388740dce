//! Per-device tracking of authenticated users.

mod tracker;

pub use tracker::{DeviceTracker, TrackError, TrackOutcome};

use crate::models::DeviceFingerprint;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Refusing to record a device without a user id")]
    EmptyUserId,
    #[error("Device storage unavailable")]
    Unavailable(#[source] anyhow::Error),
    #[error("Device storage rejected the write: {0}")]
    Rejected(String),
}

/// Durable association of fingerprints with users.
///
/// Implementations upsert on `(user_id, fingerprint_id)`: a repeated call is
/// the normal case and must succeed.
pub trait FingerprintRecorder: Send + Sync + 'static {
    fn record(
        &self,
        user_id: &str,
        fingerprint: &DeviceFingerprint,
    ) -> impl Future<Output = Result<(), RecordError>> + Send;
}
