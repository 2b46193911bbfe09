//! Error types for dateroute
//!
//! [`RoutingError`] is what version resolution and dispatch produce.
//! [`ApiError`] is its HTTP-facing form: a status code plus a JSON body.

use http::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for handlers returning API errors
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Failure to route a request to a handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The version token was present but malformed
    #[error("invalid version `{value}` in {field}: {reason}")]
    InvalidVersion {
        /// Field the token came from (lowercased header name or `host`)
        field: String,
        /// The raw token
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// No token was sent and the default policy requires one
    #[error("missing required version in {field}")]
    MissingVersion {
        /// Field the token was expected in
        field: String,
    },

    /// No route matches the path (also used for dates before the oldest version)
    #[error("no route found for {method} {path}")]
    NotFound {
        /// Request method
        method: Method,
        /// Request path
        path: String,
    },

    /// The path is known but not for this method
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method
        method: Method,
        /// Request path
        path: String,
        /// Methods registered for the path
        allowed: Vec<Method>,
    },
}

impl RoutingError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidVersion { .. } | Self::MissingVersion { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// Standard API error type
///
/// Provides structured error responses following a consistent JSON format.
/// Validation errors (422) render as a JSON array of [`FieldError`] entries;
/// every other error renders as `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level validation errors
    pub fields: Option<Vec<FieldError>>,
    /// Methods to advertise in the `Allow` header (405 only)
    pub allow: Option<Vec<Method>>,
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Location of the field, e.g. `["header", "x-api-version"]`
    pub loc: Vec<String>,
    /// Human-readable message
    pub msg: String,
    /// Error code
    #[serde(rename = "type")]
    pub error_type: String,
}

impl FieldError {
    /// Error located in a request header
    pub fn header(
        name: impl Into<String>,
        msg: impl Into<String>,
        error_type: impl Into<String>,
    ) -> Self {
        Self {
            loc: vec!["header".to_string(), name.into()],
            msg: msg.into(),
            error_type: error_type.into(),
        }
    }
}

impl ApiError {
    /// Create a new API error
    pub fn new(
        status: StatusCode,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            fields: None,
            allow: None,
        }
    }

    /// Create a validation error with field details
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error_type: "validation_error".to_string(),
            message: "Request validation failed".to_string(),
            fields: Some(fields),
            allow: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 405 Method Not Allowed error
    pub fn method_not_allowed(message: impl Into<String>, allowed: Vec<Method>) -> Self {
        let mut err = Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", message);
        err.allow = Some(allowed);
        err
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON representation of a non-validation error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message: err.message,
            },
        }
    }
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        let message = err.to_string();
        match err {
            RoutingError::InvalidVersion { field, reason, .. } => {
                ApiError::validation(vec![FieldError::header(field, reason, "value_error.date")])
            }
            RoutingError::MissingVersion { field } => ApiError::validation(vec![
                FieldError::header(field, "field required", "value_error.missing"),
            ]),
            RoutingError::NotFound { .. } => ApiError::not_found(message),
            RoutingError::MethodNotAllowed { allowed, .. } => {
                ApiError::method_not_allowed(message, allowed)
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        tracing::debug!(error = %err, "HTTP error while handling request");
        ApiError::internal("HTTP error")
    }
}
