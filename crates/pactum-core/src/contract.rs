//! Handler contracts.
//!
//! A [`HandlerContract`] binds a method and path to a schema set and a
//! handler body. Registration erases the schema types: the stored executable
//! takes a [`RawRequest`] and a [`ResponseWriter`] and returns a
//! [`Computation`] that
//!
//! 1. decodes query, params and body in that order,
//! 2. runs the handler body,
//! 3. validates the response against the response slot,
//! 4. hands the validated response to the writer.
//!
//! Any failure short-circuits with exactly one [`ApiError`]. A panic at any
//! step (a validator, the handler body, response serialization or the
//! writer) is caught and reported as [`ApiError::UnexpectedServer`].
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use pactum_core::fixtures::RecordingWriter;
//! use pactum_core::schema::Schema;
//! use pactum_core::slot::{checked, HandlerSchemas};
//! use pactum_core::{HandlerContract, RawRequest};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let health = HandlerContract::register(
//!     Method::GET,
//!     "/health",
//!     HandlerSchemas::new(checked(Schema::object(vec![("status", Schema::string().required())]))),
//!     |_input| async { Ok(json!({ "status": "ok" })) },
//! )
//! .unwrap();
//!
//! let mut writer = RecordingWriter::new();
//! health
//!     .execute(RawRequest::new(Method::GET, "/health"), &mut writer)
//!     .await
//!     .unwrap();
//! assert_eq!(writer.responses(), &[json!({ "status": "ok" })]);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use http::Method;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::error::ApiError;
use crate::request::{RawRequest, RequestId};
use crate::route::{ContractError, RouteKey};
use crate::slot::{DerivedInput, ResponseOf, ResponseSlot, SchemaDocuments, SchemaSet};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A suspendable computation that fails with an [`ApiError`].
pub type Computation<'a, T> = BoxFuture<'a, Result<T, ApiError>>;

/// Counter of finished executions, labelled by method, path and outcome.
pub const OUTCOMES_METRIC: &str = "pactum_handler_outcomes_total";

/// Histogram of execution durations in seconds, labelled by method and path.
pub const DURATION_METRIC: &str = "pactum_handler_duration_seconds";

/// Counter of executions abandoned through cancellation.
pub const CANCELLED_METRIC: &str = "pactum_handler_cancelled_total";

/// Sink for validated responses, provided by the transport.
pub trait ResponseWriter: Send {
    /// Writes one response.
    fn write(&mut self, response: Value) -> BoxFuture<'_, Result<(), WriteError>>;
}

/// A transport failure while writing a response.
#[derive(Debug, Error)]
#[error("failed to write response: {message}")]
pub struct WriteError {
    message: String,
}

impl WriteError {
    /// Creates a write error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a cancellable execution ended.
#[derive(Debug)]
pub enum Outcome {
    /// The response was validated and written.
    Completed,
    /// The execution failed with a tagged error.
    Failed(ApiError),
    /// The cancellation token fired first; nothing was written.
    Cancelled,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Completed`].
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` for [`Outcome::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the error of a failed execution.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Completed | Self::Cancelled => None,
        }
    }
}

impl From<Result<(), ApiError>> for Outcome {
    fn from(result: Result<(), ApiError>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(err) => Self::Failed(err),
        }
    }
}

/// The type-erased executable stored in a contract.
trait Executable: Send + Sync + 'static {
    fn run<'a>(
        &'a self,
        request: RawRequest,
        writer: &'a mut dyn ResponseWriter,
    ) -> Computation<'a, ()>;
}

struct TypedExecutable<S, F> {
    schemas: S,
    body: F,
}

impl<S, F, Fut> Executable for TypedExecutable<S, F>
where
    S: SchemaSet,
    F: Fn(DerivedInput<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseOf<S>, ApiError>> + Send + 'static,
{
    fn run<'a>(
        &'a self,
        request: RawRequest,
        writer: &'a mut dyn ResponseWriter,
    ) -> Computation<'a, ()> {
        Box::pin(async move {
            let (query, params, body) = request.into_parts();
            let input = self.schemas.decode_input(query, params, body)?;

            let response = (self.body)(input).await?;

            let encoded = self
                .schemas
                .response_slot()
                .encode(response)
                .map_err(ApiError::invalid_response)?;

            writer.write(encoded).await.map_err(ApiError::unexpected)?;
            Ok(())
        })
    }
}

/// A registered route: method, path, schema documents and executable.
///
/// Immutable after registration and cheap to clone.
#[derive(Clone)]
pub struct HandlerContract {
    key: RouteKey,
    documents: Arc<SchemaDocuments>,
    executable: Arc<dyn Executable>,
}

impl HandlerContract {
    /// Registers a handler body against a method, path and schema set.
    ///
    /// The body receives the input derived from `schemas` and must produce
    /// the response type of the response slot. Registration performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the method is unsupported or the path
    /// is malformed.
    pub fn register<S, F, Fut>(
        method: Method,
        path: impl Into<String>,
        schemas: S,
        body: F,
    ) -> Result<Self, ContractError>
    where
        S: SchemaSet,
        F: Fn(DerivedInput<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseOf<S>, ApiError>> + Send + 'static,
    {
        let key = RouteKey::new(method, path)?;
        let documents = Arc::new(schemas.documents());
        tracing::debug!(route = %key, "registered handler contract");

        Ok(Self {
            key,
            documents,
            executable: Arc::new(TypedExecutable { schemas, body }),
        })
    }

    /// Returns the route key.
    #[must_use]
    pub const fn key(&self) -> &RouteKey {
        &self.key
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        self.key.method()
    }

    /// Returns the path as registered.
    #[must_use]
    pub fn path(&self) -> &str {
        self.key.path()
    }

    /// Returns the schema documents captured at registration.
    #[must_use]
    pub fn documents(&self) -> &SchemaDocuments {
        &self.documents
    }

    /// Runs the handling pipeline for one request.
    ///
    /// Nothing happens until the returned computation is polled. Dropping it
    /// abandons the execution.
    pub fn execute<'a>(
        &'a self,
        request: RawRequest,
        writer: &'a mut dyn ResponseWriter,
    ) -> Computation<'a, ()> {
        Box::pin(async move {
            let request_id = request.request_id();
            let started = Instant::now();
            let result = AssertUnwindSafe(async { self.executable.run(request, writer).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(ApiError::from_panic(payload)));
            self.record(request_id, result.as_ref().err(), started.elapsed());
            result
        })
    }

    /// Runs [`execute`](Self::execute) until it finishes or `cancel` fires.
    ///
    /// Cancellation wins ties. A cancelled execution is dropped at its
    /// current suspension point: nothing is written and no [`ApiError`] is
    /// produced.
    pub async fn execute_with_cancel(
        &self,
        request: RawRequest,
        writer: &mut dyn ResponseWriter,
        cancel: &CancellationToken,
    ) -> Outcome {
        let request_id = request.request_id();
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.record_cancelled(request_id);
                Outcome::Cancelled
            }
            result = self.execute(request, writer) => Outcome::from(result),
        }
    }

    fn record(&self, request_id: RequestId, error: Option<&ApiError>, elapsed: Duration) {
        let method = self.key.method().to_string();
        let path = self.key.template().to_string();
        let outcome = error.map_or("ok", |err| err.tag().code());

        metrics::counter!(
            OUTCOMES_METRIC,
            "method" => method.clone(),
            "path" => path.clone(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(DURATION_METRIC, "method" => method, "path" => path)
            .record(elapsed.as_secs_f64());

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = elapsed.as_millis() as u64;

        let Some(err) = error else {
            tracing::info!(
                request_id = %request_id,
                http.method = %self.key.method(),
                http.path = %self.key.template(),
                duration_ms,
                "request handled"
            );
            return;
        };

        let tag = err.tag();
        let level = tag.log_level();
        if level == Level::ERROR {
            tracing::error!(
                request_id = %request_id,
                http.method = %self.key.method(),
                http.path = %self.key.template(),
                error.tag = tag.tag_name(),
                error.contract_violation = tag.is_contract_violation(),
                duration_ms,
                error = ?err,
                "request failed"
            );
        } else if level == Level::WARN {
            tracing::warn!(
                request_id = %request_id,
                http.method = %self.key.method(),
                http.path = %self.key.template(),
                error.tag = tag.tag_name(),
                duration_ms,
                error = %err,
                "request failed"
            );
        } else {
            tracing::info!(
                request_id = %request_id,
                http.method = %self.key.method(),
                http.path = %self.key.template(),
                error.tag = tag.tag_name(),
                duration_ms,
                error = %err,
                "request rejected"
            );
        }
    }

    fn record_cancelled(&self, request_id: RequestId) {
        metrics::counter!(
            CANCELLED_METRIC,
            "method" => self.key.method().to_string(),
            "path" => self.key.template().to_string()
        )
        .increment(1);
        tracing::debug!(
            request_id = %request_id,
            http.method = %self.key.method(),
            http.path = %self.key.template(),
            "request cancelled"
        );
    }
}

impl fmt::Debug for HandlerContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContract")
            .field("key", &self.key)
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}
