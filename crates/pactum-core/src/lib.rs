//! # Pactum Core
//!
//! Typed contracts for HTTP API handlers.
//!
//! This crate provides the foundational types used throughout Pactum:
//!
//! - [`slot`] - Schema slots and the input type derived from them
//! - [`schema`] - The reference [`Validator`](schema::Validator) implementation
//! - [`ApiError`] - The closed error taxonomy every handler reports through
//! - [`HandlerContract`] - Method, path, schemas and the executable computation
//! - [`Api`] - The aggregate of all contracts, its [`Specification`] and dispatch table
//!
//! The web server, router and transport are collaborators: they hand a
//! [`RawRequest`] to a contract and receive validated responses through a
//! [`ResponseWriter`].

#![doc(html_root_url = "https://docs.rs/pactum-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod contract;
mod error;
pub mod fixtures;
mod request;
pub mod route;
pub mod schema;
pub mod slot;

pub use api::{aggregate, AggregateError, Api, ApiBuilder, RouteSpec, Specification};
pub use contract::{
    BoxFuture, Computation, HandlerContract, Outcome, ResponseWriter, WriteError,
    CANCELLED_METRIC, DURATION_METRIC, OUTCOMES_METRIC,
};
pub use error::{ApiError, ApiResult, ErrorDetail, ErrorEnvelope, ErrorTag};
pub use request::{RawRequest, RequestId};
pub use route::{ContractError, RouteKey};
pub use schema::{Schema, ValidationDiagnostic, ValidationIssue, Validator};
pub use slot::{Absent, DerivedInput, HandlerSchemas, Input, Typed};

/// Re-export of the HTTP method type routes are keyed by.
pub use http::Method;

/// Re-export of the cancellation token accepted by the cancellable entry points.
pub use tokio_util::sync::CancellationToken;
