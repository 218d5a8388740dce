use crate::config::Config;
use crate::extractors::Keys;
use crate::services::DeviceService;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub device_service: Arc<DeviceService>,
    pub keys: Arc<Keys>,
    pub login_path: Arc<str>,
}

impl AppState {
    pub fn build(pool: SqlitePool, config: &Config) -> Self {
        Self {
            device_service: Arc::new(DeviceService::new(pool)),
            keys: Arc::new(Keys::new(&config.authorize)),
            login_path: Arc::from(config.guard.login_path.as_str()),
        }
    }
}
