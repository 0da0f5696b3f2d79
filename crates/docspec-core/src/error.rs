//! Error types for the host application

use http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Result type alias for request handling
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Standard API error type
///
/// Rendered as a JSON body `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
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
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", message)
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

/// JSON representation of API error response
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

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(format!("I/O error: {}", err))
    }
}

/// Failure to instantiate a resource class from its constructor arguments
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    #[error("missing constructor argument `{0}`")]
    MissingArgument(String),

    #[error("invalid constructor argument `{name}`: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("{0}")]
    Custom(String),
}

/// Errors raised while building the routing table
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid URL rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("unknown converter `{converter}` in URL rule `{rule}`")]
    UnknownConverter { rule: String, converter: String },

    #[error("URL rule `{rule}` conflicts with an existing rule: {details}")]
    Conflict { rule: String, details: String },

    #[error("view mapping is overwriting an existing endpoint `{0}`")]
    EndpointOverwrite(String),

    #[error("the name `{0}` is already registered for a blueprint")]
    BlueprintNameTaken(String),

    #[error("cannot instantiate resource `{name}`: {source}")]
    Resource {
        name: String,
        #[source]
        source: ResourceError,
    },
}
