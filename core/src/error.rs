//! Error types for the LangSmith client.
//!
//! # Design
//! Every public operation fails with exactly one `ApiError`. A non-2xx
//! response is `Remote`; a 2xx response whose body cannot be decoded is
//! `Deserialization`, never `Remote`. Nothing is retried or wrapped: the
//! first failure goes straight back to the caller.

use thiserror::Error;

use crate::http::status_line;

/// Errors returned by `LangsmithClient` and `Client`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client could not be constructed (e.g. no API key).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request payload could not be serialized. No request was sent.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The HTTP round-trip itself failed (DNS, refused connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered outside the 2xx range.
    ///
    /// `detail` is the `detail` field of the error body, or the status line
    /// when the body is not `{"detail": "..."}`.
    #[error("HTTP {status}: {detail}")]
    Remote { status: u16, detail: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl ApiError {
    /// Status code of a `Remote` error, `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<ureq::Error> for ApiError {
    /// An agent built with `http_status_as_error(true)` reports non-2xx
    /// answers as `StatusCode`; those are still `Remote`.
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => ApiError::Remote {
                status,
                detail: status_line(status),
            },
            other => ApiError::Transport(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_status_and_detail() {
        let err = ApiError::Remote {
            status: 404,
            detail: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn non_remote_errors_have_no_status() {
        let err = ApiError::Configuration("langsmith api key is required".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn ureq_status_error_is_remote() {
        let err = ApiError::from(ureq::Error::StatusCode(503));
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: 503 Service Unavailable");
    }

    #[test]
    fn other_ureq_errors_are_transport() {
        let err = ApiError::from(ureq::Error::ConnectionFailed);
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
