//! Errors raised by the documentation extension

use docspec_core::{ResourceError, RouteError};

/// Result type alias for documentation operations
pub type Result<T, E = DocsError> = std::result::Result<T, E>;

/// Everything that can go wrong while registering documentation
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// The registration target is neither a view function nor a resource
    /// class. Signals a programming error.
    #[error("cannot document {kind} view `{name}`: only view functions and resource classes can be registered")]
    Usage { kind: &'static str, name: String },

    /// No URL rule is bound to the endpoint
    #[error("no URL rule registered for endpoint `{endpoint}`")]
    Lookup { endpoint: String },

    /// Several blueprints bind the endpoint and none was named
    #[error("endpoint `{endpoint}` is ambiguous, pass a blueprint to pick one of: {}", .candidates.join(", "))]
    Ambiguous {
        endpoint: String,
        candidates: Vec<String>,
    },

    /// The resource class could not be instantiated for introspection
    #[error("cannot instantiate resource `{name}` for documentation: {source}")]
    Construct {
        name: String,
        #[source]
        source: ResourceError,
    },

    /// Registering the documentation routes failed
    #[error(transparent)]
    Route(#[from] RouteError),

    /// An operation assembled from annotations is not a valid operation object
    #[error("invalid operation for `{path}`: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// `init_app` was called on an instance that is already attached
    #[error("documentation is already attached to application `{0}`")]
    AlreadyAttached(String),

    /// The operation needs an attached application
    #[error("documentation is not attached to an application, call `init_app` first")]
    NotAttached,
}

impl DocsError {
    /// Whether this is a wrong-target-type error
    pub fn is_usage(&self) -> bool {
        matches!(self, DocsError::Usage { .. })
    }
}
