use crate::media::MediaError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy)]
pub enum Operation {
    Analyze,
    Download,
}

impl Operation {
    fn failed(self) -> &'static str {
        match self {
            Operation::Analyze => "Failed to retrieve video information",
            Operation::Download => "Failed to download video",
        }
    }

    fn unexpected(self) -> &'static str {
        match self {
            Operation::Analyze => "Unexpected error while analyzing URL",
            Operation::Download => "Unexpected error while downloading",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

/// Error response with a stable `error` message and optional detail and hint.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    detail: Option<String>,
    hint: Option<&'static str>,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str) -> Self {
        Self {
            status,
            error,
            detail: None,
            hint: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn invalid_url() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid or missing URL")
    }

    pub fn missing_format_id() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Missing format_id")
    }

    pub fn malformed_body() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid JSON body")
    }

    /// The request body could not be read, e.g. it exceeded the size limit.
    pub fn unreadable_body(status: StatusCode, detail: String) -> Self {
        Self::new(status, "Invalid request body").with_detail(detail)
    }

    pub fn from_media(err: MediaError, operation: Operation) -> Self {
        let hint = err.hint();
        let api_error = match err {
            MediaError::InvalidUrl => Self::invalid_url(),
            MediaError::InvalidPath(reason) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid filename or subfolder")
                    .with_detail(reason)
            }
            MediaError::AccessDenied { detail } => {
                Self::new(StatusCode::FORBIDDEN, "Source is blocking this request")
                    .with_detail(detail)
            }
            MediaError::Extraction { detail } => {
                Self::new(StatusCode::BAD_REQUEST, operation.failed()).with_detail(detail)
            }
            MediaError::Backend(detail) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, operation.unexpected())
                    .with_detail(detail)
            }
            MediaError::Io(e) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, operation.unexpected())
                .with_detail(e.to_string()),
            MediaError::FileMissing(path) => {
                error!("Downloaded file missing: {}", path.display());
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Downloaded file not found on server",
                )
            }
        };

        Self { hint, ..api_error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "{}", self.error);
        } else {
            warn!(status = %self.status, detail = ?self.detail, "{}", self.error);
        }

        let body = ErrorBody {
            error: self.error,
            detail: self.detail,
            hint: self.hint,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_taxonomy() {
        let cases = [
            (MediaError::InvalidUrl, StatusCode::BAD_REQUEST),
            (MediaError::InvalidPath("..".into()), StatusCode::BAD_REQUEST),
            (
                MediaError::AccessDenied { detail: "bot".into() },
                StatusCode::FORBIDDEN,
            ),
            (
                MediaError::Extraction { detail: "gone".into() },
                StatusCode::BAD_REQUEST,
            ),
            (MediaError::Backend("crash".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                MediaError::FileMissing(PathBuf::from("/x")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from_media(err, Operation::Download).status(), status);
        }
    }

    #[test]
    fn test_messages_depend_on_operation() {
        let analyze = ApiError::from_media(
            MediaError::Extraction { detail: "x".into() },
            Operation::Analyze,
        );
        assert_eq!(analyze.error, "Failed to retrieve video information");
        assert_eq!(analyze.detail.as_deref(), Some("x"));

        let download = ApiError::from_media(MediaError::Backend("x".into()), Operation::Download);
        assert_eq!(download.error, "Unexpected error while downloading");
    }

    #[test]
    fn test_access_denied_carries_hint() {
        let err = ApiError::from_media(
            MediaError::AccessDenied { detail: "bot".into() },
            Operation::Analyze,
        );
        assert!(err.hint.is_some());
        assert_eq!(err.detail.as_deref(), Some("bot"));

        let missing = ApiError::from_media(
            MediaError::FileMissing(PathBuf::from("/srv/videos/x.mp4")),
            Operation::Download,
        );
        assert!(missing.hint.is_none());
        assert!(missing.detail.is_none());
    }
}
