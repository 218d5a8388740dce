use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecordDeviceBodyDto {
    /// must match the session user when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// the id the client computed; the server recomputes its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_id: Option<String>,
    #[serde(default)]
    pub signals: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordDeviceResponseDto {
    pub fingerprint_id: String,
}
