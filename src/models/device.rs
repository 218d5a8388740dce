use crate::models::{Timestamp, Ulid};
use serde::Serialize;
use std::collections::BTreeMap;

/// Heuristic identity of one device/runtime instance.
///
/// `fingerprint_id` is a digest of `signals`; two devices with identical
/// configurations collide, which is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFingerprint {
    pub signals: BTreeMap<String, String>,
    pub fingerprint_id: String,
}

/// Persisted association between a user and a device fingerprint.
///
/// `(user_id, fingerprint_id)` is unique; repeated recordings only move
/// `last_seen_at` forward.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub id: Ulid,
    pub user_id: String,
    pub fingerprint_id: String,
    pub signals: BTreeMap<String, String>,
    pub first_seen_at: Timestamp,
    pub last_seen_at: Timestamp,
}
