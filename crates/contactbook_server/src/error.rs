//! Translation of domain errors into HTTP responses.
//!
//! # Responsibility
//! - Map service error kinds onto status codes.
//! - Log every error once, at the point it becomes a response.
//!
//! # Invariants
//! - `BadResource`/`AlreadyExists`/`NotFound` responses carry no body.
//! - Store faults never leak SQL detail to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contactbook_core::{
    sanitize_log_value, ContactServiceError, RepoError, MAX_LOGGED_VALUE_CHARS,
};
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Service-level failure, including store faults.
    Service(ContactServiceError),
    /// Request body or parameters could not be decoded.
    BadRequest(String),
    /// Adapter-level failure outside the service.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ContactServiceError::BadResource(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(ContactServiceError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Service(ContactServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ContactServiceError::Repo(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Service(err) => err.code(),
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactServiceError> for ApiError {
    fn from(value: ContactServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = sanitize_log_value(&self.to_string(), MAX_LOGGED_VALUE_CHARS);
        if status.is_server_error() {
            error!(
                "event=http_error module=server status=error http_status={} error_code={} error={message}",
                status.as_u16(),
                self.code()
            );
        } else {
            warn!(
                "event=http_error module=server status=error http_status={} error_code={} error={message}",
                status.as_u16(),
                self.code()
            );
        }

        match self {
            Self::Service(ContactServiceError::Repo(_)) => {
                (status, "internal store failure").into_response()
            }
            Self::Service(_) => status.into_response(),
            Self::BadRequest(message) => (status, message).into_response(),
            Self::Internal(message) => (status, message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use contactbook_core::{ContactServiceError, ContactValidationError, RepoError};

    #[test]
    fn service_errors_map_to_expected_statuses() {
        let cases = [
            (
                ApiError::Service(ContactServiceError::BadResource(vec![
                    ContactValidationError::BlankName,
                ])),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Service(ContactServiceError::AlreadyExists("dup".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Service(ContactServiceError::NotFound(7)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(RepoError::InvalidData("broken row".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::BadRequest("eof".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn repo_not_found_becomes_http_not_found() {
        let err = ApiError::from(RepoError::NotFound(4));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
