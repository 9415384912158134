use std::path::PathBuf;
use thiserror::Error;

/// Shown alongside access-denied failures so operators know how to unblock them.
pub const ACCESS_DENIED_HINT: &str = "This media requires authentication / bot verification. \
Configure a cookies file for the extraction backend (backend.cookie_file or --cookie-file) \
if you need to support such media.";

/// Failure categories an extraction backend adapter maps its own errors into.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The source refused access, e.g. a sign-in or bot-verification challenge.
    #[error("access denied by source: {0}")]
    AccessDenied(String),

    /// The backend ran but could not extract or download the media.
    #[error("{0}")]
    Failed(String),

    /// The backend could not be run, timed out, or produced unusable output.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid or missing URL")]
    InvalidUrl,

    #[error("invalid output path: {0}")]
    InvalidPath(String),

    #[error("access denied: {detail}")]
    AccessDenied { detail: String },

    #[error("extraction failed: {detail}")]
    Extraction { detail: String },

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("downloaded file not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for MediaError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::AccessDenied(detail) => MediaError::AccessDenied { detail },
            BackendError::Failed(detail) => MediaError::Extraction { detail },
            BackendError::Unavailable(detail) => MediaError::Backend(detail),
        }
    }
}

impl MediaError {
    /// Remediation hint for errors the operator can fix by configuration.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            MediaError::AccessDenied { .. } => Some(ACCESS_DENIED_HINT),
            _ => None,
        }
    }
}
