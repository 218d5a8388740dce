use crate::tracking::RecordError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum AppError {
    BadRequest(anyhow::Error),
    Unauthorized,
    Forbidden,
    ResourceNotFound,
    ServiceUnavailable(anyhow::Error),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn from_record(err: RecordError) -> Self {
        match err {
            RecordError::EmptyUserId => AppError::BadRequest(err.into()),
            RecordError::Unavailable(_) => AppError::ServiceUnavailable(err.into()),
            RecordError::Rejected(_) => AppError::Internal(err.into()),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(error) => write!(f, "{error}"),
            AppError::Unauthorized => f.write_str("Access denied: unauthorized."),
            AppError::Forbidden => f.write_str("Access forbidden: insufficient permissions."),
            AppError::ResourceNotFound => f.write_str("The requested resource could not be found."),
            AppError::ServiceUnavailable(_) => {
                f.write_str("The service is temporarily unavailable. Please try again later.")
            }
            AppError::Internal(_) => {
                f.write_str("An internal error occurred. Please try again later.")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(err) | AppError::Internal(err) => {
                tracing::error!("{err}");
                err.chain()
                    .skip(1)
                    .for_each(|cause| tracing::error!("Because: {}", cause));
                if matches!(self, AppError::ServiceUnavailable(_)) {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        };
        if status.is_client_error() {
            tracing::debug!("{status}: {message}");
        }
        (status, message).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(value: E) -> Self {
        Self::Internal(value.into())
    }
}
