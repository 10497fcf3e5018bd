//! The closed error taxonomy.
//!
//! Every failure that crosses a [`HandlerContract`](crate::HandlerContract)
//! boundary is exactly one [`ApiError`]. The variant's [`ErrorTag`] alone
//! decides the HTTP status, the log level and how much of the cause is shown
//! to the caller:
//!
//! | Tag | Status | Caller sees |
//! |---|---|---|
//! | `NotFoundError` | 404 | message |
//! | `InvalidQueryError` | 400 | diagnostic |
//! | `InvalidParamsError` | 400 | diagnostic |
//! | `InvalidBodyError` | 400 | diagnostic |
//! | `InvalidResponseError` | 500 | generic message |
//! | `ServerError` | 500 | generic message |
//! | `UnexpectedServerError` | 500 | generic message |
//!
//! Lower-level failures are classified with `?`: any [`anyhow::Error`]
//! converts into [`ApiError::UnexpectedServer`].

use std::any::Any;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::request::RequestId;
use crate::schema::ValidationDiagnostic;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Discriminant of an [`ApiError`].
///
/// Serialized with the taxonomy names (`"NotFoundError"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorTag {
    /// The requested resource or route does not exist.
    #[serde(rename = "NotFoundError")]
    NotFound,
    /// The query string failed its schema.
    #[serde(rename = "InvalidQueryError")]
    InvalidQuery,
    /// The path parameters failed their schema.
    #[serde(rename = "InvalidParamsError")]
    InvalidParams,
    /// The request body failed its schema.
    #[serde(rename = "InvalidBodyError")]
    InvalidBody,
    /// The handler produced a response that fails the response schema.
    #[serde(rename = "InvalidResponseError")]
    InvalidResponse,
    /// A failure raised on purpose by handler logic.
    #[serde(rename = "ServerError")]
    Server,
    /// Anything not otherwise classified.
    #[serde(rename = "UnexpectedServerError")]
    UnexpectedServer,
}

impl ErrorTag {
    /// Every tag, in taxonomy order.
    pub const ALL: [ErrorTag; 7] = [
        Self::NotFound,
        Self::InvalidQuery,
        Self::InvalidParams,
        Self::InvalidBody,
        Self::InvalidResponse,
        Self::Server,
        Self::UnexpectedServer,
    ];

    /// Returns the taxonomy name of the tag.
    #[must_use]
    pub const fn tag_name(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFoundError",
            Self::InvalidQuery => "InvalidQueryError",
            Self::InvalidParams => "InvalidParamsError",
            Self::InvalidBody => "InvalidBodyError",
            Self::InvalidResponse => "InvalidResponseError",
            Self::Server => "ServerError",
            Self::UnexpectedServer => "UnexpectedServerError",
        }
    }

    /// Returns a machine-readable error code for envelopes and metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::InvalidBody => "INVALID_BODY",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::Server => "SERVER_ERROR",
            Self::UnexpectedServer => "UNEXPECTED_SERVER_ERROR",
        }
    }

    /// Returns the HTTP status code for this tag.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidQuery | Self::InvalidParams | Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::InvalidResponse | Self::Server | Self::UnexpectedServer => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` when the caller caused the failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound | Self::InvalidQuery | Self::InvalidParams | Self::InvalidBody => true,
            Self::InvalidResponse | Self::Server | Self::UnexpectedServer => false,
        }
    }

    /// Returns `true` when the handler broke its own response contract.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        match self {
            Self::InvalidResponse => true,
            Self::NotFound
            | Self::InvalidQuery
            | Self::InvalidParams
            | Self::InvalidBody
            | Self::Server
            | Self::UnexpectedServer => false,
        }
    }

    /// Returns the level failures with this tag are logged at.
    #[must_use]
    pub const fn log_level(&self) -> Level {
        match self {
            Self::NotFound | Self::InvalidQuery | Self::InvalidParams | Self::InvalidBody => {
                Level::INFO
            }
            Self::Server => Level::WARN,
            Self::InvalidResponse | Self::UnexpectedServer => Level::ERROR,
        }
    }

    /// Returns the message shown to callers when the cause must stay internal.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound => "The requested resource was not found",
            Self::InvalidQuery => "The query string is invalid",
            Self::InvalidParams => "The path parameters are invalid",
            Self::InvalidBody => "The request body is invalid",
            Self::InvalidResponse | Self::Server | Self::UnexpectedServer => {
                "An internal error occurred"
            }
        }
    }
}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// A tagged failure from the handling pipeline.
///
/// The `Display` output includes the cause and is meant for logs only; use
/// [`to_envelope`](Self::to_envelope) for anything sent to a caller.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested resource or route target does not exist.
    #[error("NotFoundError: {cause}")]
    NotFound {
        /// What was not found.
        #[source]
        cause: anyhow::Error,
    },

    /// The query string failed validation.
    #[error("InvalidQueryError: {diagnostic}")]
    InvalidQuery {
        /// The validator's diagnostic.
        #[source]
        diagnostic: ValidationDiagnostic,
    },

    /// The path parameters failed validation.
    #[error("InvalidParamsError: {diagnostic}")]
    InvalidParams {
        /// The validator's diagnostic.
        #[source]
        diagnostic: ValidationDiagnostic,
    },

    /// The request body failed validation.
    #[error("InvalidBodyError: {diagnostic}")]
    InvalidBody {
        /// The validator's diagnostic.
        #[source]
        diagnostic: ValidationDiagnostic,
    },

    /// The handler's response failed the declared response schema.
    #[error("InvalidResponseError: {diagnostic}")]
    InvalidResponse {
        /// The validator's diagnostic.
        #[source]
        diagnostic: ValidationDiagnostic,
    },

    /// An anticipated failure raised by handler logic.
    #[error("ServerError: {cause}")]
    Server {
        /// The underlying failure (not exposed to callers).
        #[source]
        cause: anyhow::Error,
    },

    /// Any failure not otherwise classified.
    #[error("UnexpectedServerError: {cause}")]
    UnexpectedServer {
        /// The underlying failure (not exposed to callers).
        #[source]
        cause: anyhow::Error,
    },
}

impl ApiError {
    /// Creates a not found error.
    pub fn not_found<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self::NotFound {
            cause: anyhow::Error::msg(message),
        }
    }

    /// Creates an invalid query error.
    #[must_use]
    pub fn invalid_query(diagnostic: ValidationDiagnostic) -> Self {
        Self::InvalidQuery { diagnostic }
    }

    /// Creates an invalid params error.
    #[must_use]
    pub fn invalid_params(diagnostic: ValidationDiagnostic) -> Self {
        Self::InvalidParams { diagnostic }
    }

    /// Creates an invalid body error.
    #[must_use]
    pub fn invalid_body(diagnostic: ValidationDiagnostic) -> Self {
        Self::InvalidBody { diagnostic }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(diagnostic: ValidationDiagnostic) -> Self {
        Self::InvalidResponse { diagnostic }
    }

    /// Creates a server error from a message.
    pub fn server<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self::Server {
            cause: anyhow::Error::msg(message),
        }
    }

    /// Creates a server error wrapping an underlying failure.
    pub fn server_with_source(source: impl Into<anyhow::Error>) -> Self {
        Self::Server {
            cause: source.into(),
        }
    }

    /// Wraps an unclassified failure.
    pub fn unexpected(cause: impl Into<anyhow::Error>) -> Self {
        Self::UnexpectedServer {
            cause: cause.into(),
        }
    }

    /// Wraps a panic payload caught at the contract boundary.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::UnexpectedServer {
            cause: anyhow::anyhow!("panicked during execution: {message}"),
        }
    }

    /// Returns the discriminant.
    #[must_use]
    pub const fn tag(&self) -> ErrorTag {
        match self {
            Self::NotFound { .. } => ErrorTag::NotFound,
            Self::InvalidQuery { .. } => ErrorTag::InvalidQuery,
            Self::InvalidParams { .. } => ErrorTag::InvalidParams,
            Self::InvalidBody { .. } => ErrorTag::InvalidBody,
            Self::InvalidResponse { .. } => ErrorTag::InvalidResponse,
            Self::Server { .. } => ErrorTag::Server,
            Self::UnexpectedServer { .. } => ErrorTag::UnexpectedServer,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.tag().status_code()
    }

    /// Returns the validation diagnostic, if this error carries one.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&ValidationDiagnostic> {
        match self {
            Self::InvalidQuery { diagnostic }
            | Self::InvalidParams { diagnostic }
            | Self::InvalidBody { diagnostic }
            | Self::InvalidResponse { diagnostic } => Some(diagnostic),
            Self::NotFound { .. } | Self::Server { .. } | Self::UnexpectedServer { .. } => None,
        }
    }

    /// Converts this error to a caller-facing envelope.
    ///
    /// Client errors carry their detail; server-side errors carry only the
    /// generic message of their tag.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<RequestId>) -> ErrorEnvelope {
        let tag = self.tag();
        let (message, details) = match self {
            Self::NotFound { cause } => (cause.to_string(), None),
            Self::InvalidQuery { diagnostic }
            | Self::InvalidParams { diagnostic }
            | Self::InvalidBody { diagnostic } => (
                tag.public_message().to_string(),
                serde_json::to_value(diagnostic).ok(),
            ),
            Self::InvalidResponse { .. } | Self::Server { .. } | Self::UnexpectedServer { .. } => {
                (tag.public_message().to_string(), None)
            }
        };

        ErrorEnvelope {
            error: ErrorDetail {
                tag,
                code: tag.code().to_string(),
                message,
                details,
            },
            request_id,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(cause: anyhow::Error) -> Self {
        Self::UnexpectedServer { cause }
    }
}

/// Serializable error body for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl ErrorEnvelope {
    /// Returns the HTTP status code the envelope should be sent with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.error.tag.status_code()
    }
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Taxonomy tag.
    #[serde(rename = "_tag")]
    pub tag: ErrorTag,
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Structured diagnostic for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationIssue;

    fn diagnostic() -> ValidationDiagnostic {
        ValidationDiagnostic::single("$.id", "expected integer, got string")
    }

    #[test]
    fn test_every_tag_maps_to_an_error_status() {
        for tag in ErrorTag::ALL {
            let status = tag.status_code();
            if tag.is_client_error() {
                assert!(status.is_client_error(), "{tag} should be 4xx");
            } else {
                assert!(status.is_server_error(), "{tag} should be 5xx");
            }
        }
    }

    #[test]
    fn test_only_invalid_response_is_a_contract_violation() {
        let violations: Vec<ErrorTag> = ErrorTag::ALL
            .into_iter()
            .filter(ErrorTag::is_contract_violation)
            .collect();
        assert_eq!(violations, vec![ErrorTag::InvalidResponse]);
        assert_eq!(ErrorTag::InvalidResponse.log_level(), Level::ERROR);
    }

    #[test]
    fn test_tag_serializes_with_taxonomy_name() {
        let json = serde_json::to_string(&ErrorTag::InvalidParams).unwrap();
        assert_eq!(json, "\"InvalidParamsError\"");
        for tag in ErrorTag::ALL {
            let json = serde_json::to_value(tag).unwrap();
            assert_eq!(json, tag.tag_name());
        }
    }

    #[test]
    fn test_constructors_set_tags() {
        assert_eq!(ApiError::not_found("item 7").tag(), ErrorTag::NotFound);
        assert_eq!(
            ApiError::invalid_query(diagnostic()).tag(),
            ErrorTag::InvalidQuery
        );
        assert_eq!(
            ApiError::invalid_params(diagnostic()).tag(),
            ErrorTag::InvalidParams
        );
        assert_eq!(
            ApiError::invalid_body(diagnostic()).tag(),
            ErrorTag::InvalidBody
        );
        assert_eq!(
            ApiError::invalid_response(diagnostic()).tag(),
            ErrorTag::InvalidResponse
        );
        assert_eq!(ApiError::server("db down").tag(), ErrorTag::Server);
        assert_eq!(
            ApiError::unexpected(std::io::Error::other("disk")).tag(),
            ErrorTag::UnexpectedServer
        );
    }

    #[test]
    fn test_anyhow_converts_to_unexpected() {
        fn fallible() -> ApiResult<()> {
            Err(anyhow::anyhow!("socket closed"))?;
            Ok(())
        }
        let err = fallible().unwrap_err();
        assert_eq!(err.tag(), ErrorTag::UnexpectedServer);
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_client_envelope_carries_diagnostic() {
        let err = ApiError::invalid_params(diagnostic());
        let envelope = err.to_envelope(None);
        assert_eq!(envelope.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope.error.code, "INVALID_PARAMS");

        let details = envelope.error.details.unwrap();
        assert_eq!(details["issues"][0]["path"], "$.id");
    }

    #[test]
    fn test_server_envelopes_hide_cause() {
        let secret = "password=hunter2";
        let errors = [
            ApiError::server(secret),
            ApiError::unexpected(anyhow::anyhow!(secret)),
            ApiError::invalid_response(ValidationDiagnostic::single("$", secret)),
        ];
        for err in errors {
            let json = serde_json::to_string(&err.to_envelope(None)).unwrap();
            assert!(!json.contains(secret), "leaked cause in {json}");
            assert!(json.contains("An internal error occurred"));
        }
    }

    #[test]
    fn test_envelope_serialization() {
        let id = RequestId::new();
        let envelope = ApiError::not_found("no such item").to_envelope(Some(id));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["_tag"], "NotFoundError");
        assert_eq!(json["error"]["message"], "no such item");
        assert_eq!(json["request_id"], id.to_string());
    }

    #[test]
    fn test_panic_payloads() {
        let err = ApiError::from_panic(Box::new("boom"));
        assert!(err.to_string().contains("boom"));

        let err = ApiError::from_panic(Box::new(String::from("bang")));
        assert!(err.to_string().contains("bang"));

        let err = ApiError::from_panic(Box::new(42_u8));
        assert!(err.to_string().contains("unknown panic payload"));
    }

    #[test]
    fn test_diagnostic_accessor() {
        let mut diag = diagnostic();
        diag.push(ValidationIssue::new("$.name", "missing"));
        let err = ApiError::invalid_body(diag);
        assert_eq!(err.diagnostic().map(ValidationDiagnostic::len), Some(2));
        assert!(ApiError::server("x").diagnostic().is_none());
    }
}
