use crate::common::{ApiResult, AppError};
use crate::extractors::CurrentUser;
use crate::fingerprint::{self, Environment};
use crate::models::DeviceRecord;
use crate::models::dtos::device::{RecordDeviceBodyDto, RecordDeviceResponseDto};
use crate::state::AppState;
use crate::tracking::FingerprintRecorder;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

/// Records the calling device for the session user.
pub async fn record(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(body): Json<RecordDeviceBodyDto>,
) -> ApiResult<Json<RecordDeviceResponseDto>> {
    if body.user_id.as_ref().is_some_and(|it| it != &user.id) {
        tracing::warn!(
            "User {} tried to record a device for another user",
            user.id
        );
        return Err(AppError::Forbidden);
    }
    let environment = if body.signals.is_empty() {
        Environment::from_headers(&headers)
    } else {
        Environment::from_signals(&body.signals)
    };
    let fingerprint = fingerprint::generate(&environment);
    if let Some(reported) = body
        .fingerprint_id
        .as_ref()
        .filter(|it| *it != &fingerprint.fingerprint_id)
    {
        tracing::debug!(
            "Reported fingerprint {reported} differs from derived {}",
            fingerprint.fingerprint_id
        );
    }
    state
        .device_service
        .record(&user.id, &fingerprint)
        .await
        .map_err(AppError::from_record)?;
    Ok(Json(RecordDeviceResponseDto {
        fingerprint_id: fingerprint.fingerprint_id,
    }))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<DeviceRecord>>> {
    let devices = state.device_service.list_by_user(&user.id).await?;
    Ok(Json(devices))
}
