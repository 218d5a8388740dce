use serde::Deserialize;

/// Verification settings for bearer tokens minted by the session store.
#[derive(Deserialize, Debug, Clone)]
pub struct AuthorizeConfig {
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_issuer() -> String {
    "doorstep".to_string()
}
