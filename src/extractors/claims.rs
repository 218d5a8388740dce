use crate::config::AuthorizeConfig;
use crate::models::User;
use crate::session::SessionLookupError;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    iss: String,
    sub: String,
    exp: i64,
    jti: String,
}

/// Keys shared with the session store that mints the bearer tokens.
pub struct Keys {
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub fn new(config: &AuthorizeConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Mints a token for `user_id` valid for `expire` seconds.
    pub fn issue(&self, user_id: &str, expire: i64) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            exp: now.timestamp() + expire,
            jti: ulid::Ulid::new().to_string(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Resolves the session carried by the `Authorization` header.
    ///
    /// A missing, expired or forged token means nobody is signed in; only a
    /// verifier that cannot do its job is reported as a lookup failure.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Option<User>, SessionLookupError> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) if data.claims.sub.trim().is_empty() => Ok(None),
            Ok(data) => Ok(Some(User::new(data.claims.sub))),
            Err(err) if matches!(err.kind(), ErrorKind::InvalidKeyFormat | ErrorKind::Crypto(_)) => {
                Err(SessionLookupError::Unreachable(err.into()))
            }
            Err(err) => {
                tracing::debug!("Bearer token refused: {err}");
                Ok(None)
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|it| it.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|it| !it.is_empty())
}
