//! # Pactum
//!
//! **Typed contracts for HTTP API handlers**
//!
//! Every route declares optional schemas for its query string, path
//! parameters and body, plus a mandatory response schema. Pactum derives the
//! handler's input type from those declarations, runs the handler as a
//! cancellable computation that reports through a closed error taxonomy, and
//! aggregates all routes into a deterministic specification:
//!
//! - **Schema slots** – declared inputs are validated and typed; undeclared ones pass through as raw JSON
//! - **Closed error taxonomy** – seven tags, each with a fixed status and log level
//! - **Validated responses** – a handler that breaks its response schema fails loudly
//! - **One specification** – dispatch table and OpenAPI document from the same routes
//!
//! ## Quick Start
//!
//! ```
//! use pactum::core::fixtures::RecordingWriter;
//! use pactum::prelude::*;
//! use serde_json::json;
//!
//! let contract = HandlerContract::register(
//!     Method::GET,
//!     "/widgets/:id",
//!     HandlerSchemas::new(checked(Schema::object(vec![("id", Schema::integer())])))
//!         .params(checked(Schema::object(vec![(
//!             "id",
//!             Schema::integer().from_string().required(),
//!         )]))),
//!     |input: Input| async move {
//!         Ok::<_, ApiError>(json!({ "id": input.params["id"] }))
//!     },
//! )
//! .unwrap();
//!
//! let api = aggregate([contract]).unwrap();
//! let mut writer = RecordingWriter::new();
//! let request = RawRequest::new(Method::GET, "/widgets/:id").with_params(json!({ "id": "7" }));
//!
//! tokio_test::block_on(api.dispatch(request, &mut writer)).unwrap();
//! assert_eq!(writer.responses(), [json!({ "id": 7 })]);
//! ```
//!
//! ## Architecture
//!
//! A transport hands each matched request to the contract and receives the
//! validated response through a [`ResponseWriter`](core::ResponseWriter):
//!
//! ```text
//! RawRequest → query → params → body → handler → response schema → ResponseWriter
//!                 ↓        ↓       ↓       ↓              ↓
//!            InvalidQuery  …  InvalidBody  Server…   InvalidResponse
//! ```

#![doc(html_root_url = "https://docs.rs/pactum/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use pactum_core as core;

// Re-export documentation generation
pub use pactum_docs as docs;

// Re-export logging and metrics
pub use pactum_telemetry as telemetry;

// Re-export configuration
pub use pactum_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use pactum::prelude::*;
///
/// let schemas = HandlerSchemas::new(checked(Schema::string()));
/// # let _ = schemas;
/// ```
///
/// Test writers live in [`core::fixtures`](crate::core::fixtures), not here:
///
/// ```compile_fail
/// use pactum::prelude::*;
///
/// let _writer = RecordingWriter::new();
/// ```
pub mod prelude {
    pub use pactum_core::slot::{checked, typed, BodyInput, ParamsInput, QueryInput};
    pub use pactum_core::{
        aggregate, Absent, AggregateError, Api, ApiBuilder, ApiError, ApiResult,
        CancellationToken, ContractError, ErrorEnvelope, ErrorTag, HandlerContract,
        HandlerSchemas, Input, Outcome, RawRequest, RequestId, ResponseWriter, RouteKey, Schema,
        Specification, Typed, ValidationDiagnostic, Validator, WriteError,
    };

    pub use pactum_docs::OpenApiGenerator;

    pub use pactum_config::{ConfigLoader, PactumConfig};

    pub use pactum_telemetry::{init_telemetry, TelemetryConfig};

    pub use pactum_core::Method;
}
