use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct GuardConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
        }
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}
