use super::RemoteSessionStore;
use crate::models::DeviceFingerprint;
use crate::models::dtos::device::RecordDeviceBodyDto;
use crate::tracking::{FingerprintRecorder, RecordError};

/// Records devices through `POST /api/devices` using the session's token.
pub struct RemoteRecorder {
    session: RemoteSessionStore,
}

impl RemoteRecorder {
    pub fn new(session: RemoteSessionStore) -> Self {
        Self { session }
    }
}

impl FingerprintRecorder for RemoteRecorder {
    async fn record(
        &self,
        user_id: &str,
        fingerprint: &DeviceFingerprint,
    ) -> Result<(), RecordError> {
        if user_id.trim().is_empty() {
            return Err(RecordError::EmptyUserId);
        }
        let Some(token) = self.session.token() else {
            return Err(RecordError::Rejected("no session token".to_string()));
        };
        let body = RecordDeviceBodyDto {
            user_id: Some(user_id.to_string()),
            fingerprint_id: Some(fingerprint.fingerprint_id.clone()),
            signals: fingerprint.signals.clone(),
        };
        let response = self
            .session
            .http()
            .post(self.session.url("/api/devices"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|err| RecordError::Unavailable(err.into()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() {
            Err(RecordError::Unavailable(anyhow::anyhow!(
                "device endpoint answered {status}"
            )))
        } else {
            Err(RecordError::Rejected(format!(
                "device endpoint answered {status}"
            )))
        }
    }
}
