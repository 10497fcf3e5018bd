//! # Pactum Docs
//!
//! OpenAPI documentation for Pactum APIs.
//!
//! The aggregated [`Specification`](pactum_core::Specification) is the single
//! source of truth; this crate renders it as an OpenAPI 3.1 document.
//!
//! ## Quick Start
//!
//! ```
//! use pactum_core::fixtures::items_api;
//! use pactum_docs::OpenApiGenerator;
//!
//! let api = items_api();
//! let json = OpenApiGenerator::new()
//!     .description("Item catalogue")
//!     .generate_json(&api.specification())
//!     .unwrap();
//! assert!(json.contains("\"openapi\": \"3.1.0\""));
//! ```
//!
//! ## What gets rendered
//!
//! - path templates in `{param}` form, whichever spelling was registered
//! - path and query parameters expanded from the params and query schemas
//! - the body schema as a required JSON request body
//! - the response schema as the `200` response
//! - `400`, `404` and `500` responses sharing an `ErrorEnvelope` component

mod error;
mod openapi;

pub use error::{DocsError, DocsResult};
pub use openapi::{
    Components, Info, MediaType, OpenApi, OpenApiGenerator, Operation, Parameter, ParameterIn,
    PathItem, RequestBody, Response, Server, Tag, ERROR_ENVELOPE, OPENAPI_VERSION,
};
