//! Inbound request types.
//!
//! A [`RawRequest`] is what the external router hands to a contract after it
//! has matched a route: the loosely typed query, path parameters and body,
//! none of them validated yet.

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate and sort.
///
/// # Example
///
/// ```
/// use pactum_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID, e.g. one parsed from a
    /// correlation header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RequestId> for Uuid {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// An unvalidated request as delivered by the router.
///
/// `path` is the route template the router matched (for example
/// `/items/{id}`), not the concrete URL. `query` and `params` default to an
/// empty object, `body` to `null`.
///
/// # Example
///
/// ```
/// use http::Method;
/// use pactum_core::RawRequest;
/// use serde_json::json;
///
/// let request = RawRequest::new(Method::GET, "/items/{id}")
///     .with_params(json!({ "id": "7" }));
/// assert_eq!(request.params()["id"], "7");
/// ```
#[derive(Debug, Clone)]
pub struct RawRequest {
    request_id: RequestId,
    method: Method,
    path: String,
    query: Value,
    params: Value,
    body: Value,
}

impl RawRequest {
    /// Creates a request with a fresh request ID and empty inputs.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            body: Value::Null,
        }
    }

    /// Sets the request ID.
    #[must_use]
    pub const fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the raw query value.
    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Sets the raw path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the matched route template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query value.
    #[must_use]
    pub const fn query(&self) -> &Value {
        &self.query
    }

    /// Returns the raw path parameters.
    #[must_use]
    pub const fn params(&self) -> &Value {
        &self.params
    }

    /// Returns the raw body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Splits the request into its `(query, params, body)` values.
    #[must_use]
    pub fn into_parts(self) -> (Value, Value, Value) {
        (self.query, self.params, self.body)
    }
}
