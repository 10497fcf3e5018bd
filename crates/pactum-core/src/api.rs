//! The API aggregate.
//!
//! [`Api`] collects every [`HandlerContract`] of a service, rejects duplicate
//! method + path pairs at registration, and derives two views from the same
//! ordered route list:
//!
//! - a [`Specification`], the machine-readable description of every route
//!   and its schemas, byte-identical across regenerations;
//! - a dispatch table mapping each [`RouteKey`] to its contract, for the
//!   external router.
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use pactum_core::schema::Schema;
//! use pactum_core::slot::{checked, HandlerSchemas};
//! use pactum_core::{Api, HandlerContract};
//! use serde_json::json;
//!
//! let ping = HandlerContract::register(
//!     Method::GET,
//!     "/ping",
//!     HandlerSchemas::new(checked(Schema::string())),
//!     |_input| async { Ok(json!("pong")) },
//! )
//! .unwrap();
//!
//! let api = Api::builder("Ping Service", "1.0.0").route(ping).unwrap().build();
//! assert_eq!(api.specification().routes.len(), 1);
//! ```

use http::Method;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::contract::{Computation, HandlerContract, Outcome, ResponseWriter};
use crate::error::ApiError;
use crate::request::RawRequest;
use crate::route::RouteKey;

/// Title used by [`aggregate`] when none is given.
pub const DEFAULT_TITLE: &str = "API";

/// Version used by [`aggregate`] when none is given.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Errors raised while building an [`Api`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Two contracts share a method and path.
    #[error("duplicate route `{route}`: registered as `{first}` and again as `{second}`")]
    DuplicateRoute {
        /// Normalized route, e.g. `GET /items/{id}`.
        route: String,
        /// Path spelling of the first registration.
        first: String,
        /// Path spelling of the rejected registration.
        second: String,
    },
}

/// Builder for [`Api`].
#[derive(Debug)]
pub struct ApiBuilder {
    title: String,
    version: String,
    routes: IndexMap<RouteKey, HandlerContract>,
}

impl ApiBuilder {
    /// Adds a contract.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::DuplicateRoute`] if a contract with the same
    /// method and path was already added. The builder is consumed either way;
    /// a duplicate route is a startup failure.
    pub fn route(mut self, contract: HandlerContract) -> Result<Self, AggregateError> {
        match self.routes.entry(contract.key().clone()) {
            Entry::Occupied(existing) => {
                let err = AggregateError::DuplicateRoute {
                    route: existing.key().to_string(),
                    first: existing.get().path().to_string(),
                    second: contract.path().to_string(),
                };
                tracing::error!(error = %err, "rejected duplicate route");
                Err(err)
            }
            Entry::Vacant(slot) => {
                slot.insert(contract);
                Ok(self)
            }
        }
    }

    /// Adds every contract in order.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate, like [`route`](Self::route).
    pub fn routes<I>(self, contracts: I) -> Result<Self, AggregateError>
    where
        I: IntoIterator<Item = HandlerContract>,
    {
        contracts
            .into_iter()
            .try_fold(self, |builder, contract| builder.route(contract))
    }

    /// Finishes the aggregate.
    #[must_use]
    pub fn build(self) -> Api {
        tracing::info!(
            title = %self.title,
            version = %self.version,
            routes = self.routes.len(),
            "api aggregate built"
        );
        Api {
            title: self.title,
            version: self.version,
            routes: self.routes,
        }
    }
}

/// Aggregates contracts under the default title and version.
///
/// # Errors
///
/// Returns [`AggregateError::DuplicateRoute`] on the first duplicate.
pub fn aggregate<I>(contracts: I) -> Result<Api, AggregateError>
where
    I: IntoIterator<Item = HandlerContract>,
{
    Ok(Api::builder(DEFAULT_TITLE, DEFAULT_VERSION)
        .routes(contracts)?
        .build())
}

/// A read-only set of uniquely keyed contracts.
#[derive(Debug, Clone)]
pub struct Api {
    title: String,
    version: String,
    routes: IndexMap<RouteKey, HandlerContract>,
}

impl Api {
    /// Starts building an aggregate.
    #[must_use]
    pub fn builder(title: impl Into<String>, version: impl Into<String>) -> ApiBuilder {
        ApiBuilder {
            title: title.into(),
            version: version.into(),
            routes: IndexMap::new(),
        }
    }

    /// Returns the API title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the API version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes were registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates contracts in registration order.
    pub fn contracts(&self) -> impl Iterator<Item = &HandlerContract> {
        self.routes.values()
    }

    /// Returns the dispatch table, in registration order.
    #[must_use]
    pub const fn dispatch_table(&self) -> &IndexMap<RouteKey, HandlerContract> {
        &self.routes
    }

    /// Looks up the contract for a method and path template.
    ///
    /// Either parameter spelling matches.
    #[must_use]
    pub fn contract(&self, method: &Method, path: &str) -> Option<&HandlerContract> {
        let key = RouteKey::new(method.clone(), path).ok()?;
        self.routes.get(&key)
    }

    /// Derives the specification document.
    #[must_use]
    pub fn specification(&self) -> Specification {
        Specification {
            title: self.title.clone(),
            version: self.version.clone(),
            routes: self.routes.values().map(RouteSpec::from_contract).collect(),
        }
    }

    /// Executes the contract registered for the request's method and path.
    ///
    /// A missing route fails with [`ApiError::NotFound`].
    pub fn dispatch<'a>(
        &'a self,
        request: RawRequest,
        writer: &'a mut dyn ResponseWriter,
    ) -> Computation<'a, ()> {
        match self.contract(request.method(), request.path()) {
            Some(contract) => contract.execute(request, writer),
            None => {
                let err = route_not_found(&request);
                Box::pin(async move { Err(err) })
            }
        }
    }

    /// Cancellable form of [`dispatch`](Self::dispatch).
    pub async fn dispatch_with_cancel(
        &self,
        request: RawRequest,
        writer: &mut dyn ResponseWriter,
        cancel: &CancellationToken,
    ) -> Outcome {
        match self.contract(request.method(), request.path()) {
            Some(contract) => contract.execute_with_cancel(request, writer, cancel).await,
            None => Outcome::Failed(route_not_found(&request)),
        }
    }
}

fn route_not_found(request: &RawRequest) -> ApiError {
    tracing::info!(
        request_id = %request.request_id(),
        http.method = %request.method(),
        http.path = %request.path(),
        "no route registered"
    );
    ApiError::not_found(format!(
        "no route for {} {}",
        request.method(),
        request.path()
    ))
}

/// Machine-readable description of an [`Api`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// Routes in registration order.
    pub routes: Vec<RouteSpec>,
}

impl Specification {
    /// Serializes the specification as pretty-printed JSON.
    ///
    /// The output is identical for identical aggregates.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the specification as a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// One route of a [`Specification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// HTTP method, upper case.
    pub method: String,
    /// Path as registered.
    pub path: String,
    /// Query schema, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_schema: Option<Value>,
    /// Path parameter schema, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_schema: Option<Value>,
    /// Body schema, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_schema: Option<Value>,
    /// Response schema.
    pub response_schema: Value,
}

impl RouteSpec {
    fn from_contract(contract: &HandlerContract) -> Self {
        let documents = contract.documents();
        Self {
            method: contract.method().to_string(),
            path: contract.path().to_string(),
            query_schema: documents.query.clone(),
            params_schema: documents.params.clone(),
            body_schema: documents.body.clone(),
            response_schema: documents.response.clone(),
        }
    }
}
