//! Test fixtures for Pactum development and testing.
//!
//! This module provides response writers and a small pre-built API that can
//! be used in tests across the Pactum workspace.
//!
//! # Example
//!
//! ```
//! use pactum_core::fixtures;
//!
//! let api = fixtures::items_api();
//! assert_eq!(api.len(), 4);
//! ```

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Api;
use crate::contract::{BoxFuture, HandlerContract, ResponseWriter, WriteError};
use crate::error::ApiError;
use crate::route::ContractError;
use crate::schema::Schema;
use crate::slot::{checked, typed, HandlerSchemas};

/// A writer that records every response it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    responses: Vec<Value>,
}

impl RecordingWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the responses written so far.
    #[must_use]
    pub fn responses(&self) -> &[Value] {
        &self.responses
    }

    /// Returns the number of responses written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns `true` if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl ResponseWriter for RecordingWriter {
    fn write(&mut self, response: Value) -> BoxFuture<'_, Result<(), WriteError>> {
        self.responses.push(response);
        Box::pin(async { Ok(()) })
    }
}

/// A writer whose every write fails.
#[derive(Debug, Clone)]
pub struct FailingWriter {
    message: String,
}

impl FailingWriter {
    /// Creates a writer failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ResponseWriter for FailingWriter {
    fn write(&mut self, _response: Value) -> BoxFuture<'_, Result<(), WriteError>> {
        let err = WriteError::new(self.message.clone());
        Box::pin(async move { Err(err) })
    }
}

/// Path parameters of the item routes.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemParams {
    /// Item identifier.
    pub id: i64,
}

/// Query of the item listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    /// Maximum number of items.
    pub limit: Option<i64>,
}

/// Body of the item creation route.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    /// Item name.
    pub name: String,
}

/// A single item.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    /// Item name.
    pub name: String,
}

/// A page of items.
#[derive(Debug, Clone, Serialize)]
pub struct ItemList {
    /// The items.
    pub items: Vec<Item>,
}

const CATALOGUE: [&str; 3] = ["bolt", "nut", "washer"];

/// Schema of a single item: `{ name: string }`.
#[must_use]
pub fn item_schema() -> Schema {
    Schema::object(vec![("name", Schema::string().required())])
}

/// Schema of the item path parameters: `{ id: integer }`, coerced from string.
#[must_use]
pub fn item_params_schema() -> Schema {
    Schema::object(vec![(
        "id",
        Schema::integer().from_string().minimum_int(1).required(),
    )])
}

fn find_item(id: i64) -> Result<Item, ApiError> {
    id.checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| CATALOGUE.get(index))
        .map(|name| Item {
            name: (*name).to_string(),
        })
        .ok_or_else(|| ApiError::not_found(format!("item {id} does not exist")))
}

/// Creates an item catalogue API for testing.
///
/// Routes, in registration order:
/// - `GET /items/:id` - path params only; ids 1 to 3 exist
/// - `GET /items` - optional `limit` query
/// - `POST /items` - `{ name }` body, `min_length` 1
/// - `DELETE /items/{id}` - responds with `null`
///
/// # Panics
///
/// Panics if [`try_items_api`] fails, which would be a bug in the fixture.
///
/// # Example
///
/// ```
/// use pactum_core::fixtures::items_api;
///
/// let spec = items_api().specification();
/// assert_eq!(spec.routes[0].path, "/items/:id");
/// ```
#[must_use]
pub fn items_api() -> Api {
    try_items_api().expect("items fixture routes are valid and unique")
}

/// Fallible form of [`items_api`].
pub fn try_items_api() -> anyhow::Result<Api> {
    let list_items = HandlerContract::register(
        Method::GET,
        "/items",
        HandlerSchemas::new(typed::<ItemList>(Schema::object(vec![(
            "items",
            Schema::array(item_schema()).required(),
        )])))
        .query(typed::<ListQuery>(Schema::object(vec![(
            "limit",
            Schema::integer()
                .from_string()
                .minimum_int(1)
                .maximum_int(100),
        )]))),
        |input| async move {
            let limit = usize::try_from(input.query.limit.unwrap_or(100)).unwrap_or(0);
            Ok(ItemList {
                items: CATALOGUE
                    .iter()
                    .take(limit)
                    .map(|name| Item {
                        name: (*name).to_string(),
                    })
                    .collect(),
            })
        },
    )?;

    let create_item = HandlerContract::register(
        Method::POST,
        "/items",
        HandlerSchemas::new(typed::<Item>(item_schema())).body(typed::<NewItem>(Schema::object(
            vec![("name", Schema::string().min_length(1).required())],
        ))),
        |input| async move {
            Ok(Item {
                name: input.body.name,
            })
        },
    )?;

    let delete_item = HandlerContract::register(
        Method::DELETE,
        "/items/{id}",
        HandlerSchemas::new(checked(Schema::null()))
            .params(typed::<ItemParams>(item_params_schema())),
        |input| async move { find_item(input.params.id).map(|_| Value::Null) },
    )?;

    Ok(Api::builder("Items", "1.0.0")
        .route(get_item_contract()?)?
        .route(list_items)?
        .route(create_item)?
        .route(delete_item)?
        .build())
}

/// Creates the `GET /items/:id` contract on its own.
pub fn get_item_contract() -> Result<HandlerContract, ContractError> {
    HandlerContract::register(
        Method::GET,
        "/items/:id",
        HandlerSchemas::new(typed::<Item>(item_schema()))
            .params(typed::<ItemParams>(item_params_schema())),
        |input| async move { find_item(input.params.id) },
    )
}
