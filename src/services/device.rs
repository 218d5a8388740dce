use crate::common::ApiResult;
use crate::models::{DeviceFingerprint, DeviceRecord, Timestamp, Ulid};
use crate::tracking::{FingerprintRecorder, RecordError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

const UPSERT_DEVICE: &str = r#"
INSERT INTO devices (id, user_id, fingerprint_id, signals, first_seen_at, last_seen_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?5)
ON CONFLICT (user_id, fingerprint_id) DO UPDATE SET
    last_seen_at = MAX(devices.last_seen_at, excluded.last_seen_at),
    signals = excluded.signals
"#;

/// Device records kept in SQLite.
pub struct DeviceService {
    pool: SqlitePool,
}

impl DeviceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        user_id: &str,
        fingerprint_id: &str,
    ) -> ApiResult<Option<DeviceRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, fingerprint_id, signals, first_seen_at, last_seen_at
            FROM devices WHERE user_id = ? AND fingerprint_id = ?",
        )
        .bind(user_id)
        .bind(fingerprint_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(read_record).transpose()
    }

    /// Devices of a user, most recently seen first.
    pub async fn list_by_user(&self, user_id: &str) -> ApiResult<Vec<DeviceRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, fingerprint_id, signals, first_seen_at, last_seen_at
            FROM devices WHERE user_id = ? ORDER BY last_seen_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(read_record).collect()
    }

    async fn upsert(
        &self,
        user_id: &str,
        fingerprint: &DeviceFingerprint,
        seen_at: Timestamp,
    ) -> Result<(), RecordError> {
        if user_id.trim().is_empty() {
            return Err(RecordError::EmptyUserId);
        }
        let signals = serde_json::to_string(&fingerprint.signals)
            .map_err(|err| RecordError::Unavailable(err.into()))?;
        sqlx::query(UPSERT_DEVICE)
            .bind(Ulid::new())
            .bind(user_id)
            .bind(&fingerprint.fingerprint_id)
            .bind(signals)
            .bind(seen_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        tracing::debug!(
            "Device {} seen for user {} at {}",
            fingerprint.fingerprint_id,
            user_id,
            seen_at
        );
        Ok(())
    }
}

impl FingerprintRecorder for DeviceService {
    async fn record(
        &self,
        user_id: &str,
        fingerprint: &DeviceFingerprint,
    ) -> Result<(), RecordError> {
        self.upsert(user_id, fingerprint, Timestamp::now()).await
    }
}

fn classify(err: sqlx::Error) -> RecordError {
    match err {
        sqlx::Error::Database(err) => RecordError::Rejected(err.message().to_string()),
        err => RecordError::Unavailable(err.into()),
    }
}

fn read_record(row: &SqliteRow) -> ApiResult<DeviceRecord> {
    let signals = row.try_get_unchecked::<String, _>("signals")?;
    let signals = serde_json::from_str::<BTreeMap<String, String>>(&signals)?;
    Ok(DeviceRecord {
        id: row.try_get_unchecked::<Ulid, _>("id")?,
        user_id: row.try_get_unchecked::<String, _>("user_id")?,
        fingerprint_id: row.try_get_unchecked::<String, _>("fingerprint_id")?,
        signals,
        first_seen_at: row.try_get_unchecked::<i64, _>("first_seen_at")?.into(),
        last_seen_at: row.try_get_unchecked::<i64, _>("last_seen_at")?.into(),
    })
}
