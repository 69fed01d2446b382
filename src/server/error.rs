//! API error envelope: `{error, message}` with a mapped status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::batch::BatchError;
use crate::reports::ReportError;
use crate::repository::RepositoryError;

#[derive(Debug)]
pub enum ApiError {
    InvalidPath(String),
    BadRequest(String),
    NotFound,
    Busy,
    Conflict(String),
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound => "not_found",
            Self::Busy => "busy",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Busy | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidPath(path) => format!("not an existing directory: {path}"),
            Self::BadRequest(msg) | Self::Conflict(msg) | Self::Internal(msg) => msg.clone(),
            Self::NotFound => "not found".to_string(),
            Self::Busy => "storage is busy, retry shortly".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Busy => Self::Busy,
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::InvalidPath(path) => Self::InvalidPath(path),
            BatchError::Repository(e) => e.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound => Self::NotFound,
            ReportError::NotReady(status) => {
                Self::Conflict(format!("report is not ready (status: {status})"))
            }
            ReportError::Repository(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(RepositoryError::Busy).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_path_is_bad_request() {
        let err = ApiError::from(BatchError::InvalidPath("/x".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_path");
    }
}
