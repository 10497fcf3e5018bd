//! Error types for the documentation generation crate.

use thiserror::Error;

/// Errors that can occur during documentation generation.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the OpenAPI document to JSON.
    #[error("Failed to serialize OpenAPI document: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A route in the specification cannot be rendered.
    #[error("Invalid route '{method} {path}': {reason}")]
    InvalidRoute {
        /// The route's method.
        method: String,
        /// The route's path.
        path: String,
        /// The reason the route is invalid.
        reason: String,
    },

    /// The path parameter pattern failed to compile.
    #[error("Invalid path parameter pattern: {0}")]
    PatternError(#[from] regex::Error),
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error() {
        let err: DocsError = serde_json::from_str::<String>("invalid")
            .unwrap_err()
            .into();
        assert!(matches!(err, DocsError::SerializationError(_)));
        assert!(err.to_string().contains("serialize"));
    }

    #[test]
    fn test_invalid_route_error() {
        let err = DocsError::InvalidRoute {
            method: "GET".to_string(),
            path: "items".to_string(),
            reason: "missing leading slash".to_string(),
        };
        assert!(err.to_string().contains("GET items"));
        assert!(err.to_string().contains("missing leading slash"));
    }
}
