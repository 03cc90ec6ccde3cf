//! Error types and normalization for the weather proxy
//!
//! Every failing request resolves to exactly one [`ProxyError`], which carries
//! a closed [`ErrorKind`], a status code and an internal message. Only the
//! user-facing message derived from the kind ever reaches the caller.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CITY_NOT_FOUND: &str = "City not found";
pub const TOO_MANY_REQUESTS: &str = "Too many requests, please try again later.";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const ROUTE_NOT_FOUND: &str = "Route not found";

/// Closed set of failure categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    UpstreamTimeout,
    UpstreamFailure,
    RateLimited,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::UpstreamTimeout | ErrorKind::UpstreamFailure | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the weather proxy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProxyError {
    kind: ErrorKind,
    message: String,
}

impl ProxyError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a new validation error. The message is shown to the caller.
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn upstream_timeout<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::UpstreamTimeout, message)
    }

    pub fn upstream_failure<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::UpstreamFailure, message)
    }

    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Internal detail. Logged, never returned to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the message sent to the caller for this error
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::InvalidInput => self.message.clone(),
            ErrorKind::NotFound => CITY_NOT_FOUND.to_string(),
            ErrorKind::RateLimited => TOO_MANY_REQUESTS.to_string(),
            ErrorKind::UpstreamTimeout | ErrorKind::UpstreamFailure | ErrorKind::Internal => {
                INTERNAL_SERVER_ERROR.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        // the request URL carries the provider credential
        let err = err.without_url();
        if err.is_timeout() {
            ProxyError::upstream_timeout(format!("upstream request timed out: {err}"))
        } else {
            ProxyError::upstream_failure(format!("upstream request failed: {err}"))
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        ProxyError::upstream_failure(format!("malformed upstream payload: {err}"))
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new<S: Into<String>>(error: S) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.kind, "Request failed: {}", self.message);
        } else {
            tracing::warn!(kind = %self.kind, "Request rejected: {}", self.message);
        }

        (status, Json(ErrorBody::new(self.user_message()))).into_response()
    }
}
