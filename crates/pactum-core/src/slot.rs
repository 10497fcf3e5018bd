//! Schema slots and input derivation.
//!
//! A handler declares up to three input slots (query, path parameters, body)
//! and one mandatory response slot. Each slot either holds a validator or is
//! [`Absent`]; the slot decides, at the type level, what the handler receives:
//!
//! - a [`Typed<T>`] slot validates the raw value and hands `T` to the handler;
//! - an [`Absent`] slot performs no validation and hands over the raw
//!   [`serde_json::Value`] untouched.
//!
//! [`HandlerSchemas`] collects the four slots and [`DerivedInput`] computes the
//! handler's input type from them.
//!
//! # Example
//!
//! ```
//! use pactum_core::schema::Schema;
//! use pactum_core::slot::{typed, HandlerSchemas, SchemaSet};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct ItemParams { id: i64 }
//!
//! #[derive(Serialize)]
//! struct Item { name: String }
//!
//! let schemas = HandlerSchemas::new(typed::<Item>(Schema::object(vec![
//!     ("name", Schema::string().required()),
//! ])))
//! .params(typed::<ItemParams>(Schema::object(vec![
//!     ("id", Schema::integer().from_string().required()),
//! ])));
//!
//! let input = schemas
//!     .decode_input(json!({ "page": "2" }), json!({ "id": "7" }), json!(null))
//!     .unwrap();
//! // Params are typed; the absent query slot stays raw JSON.
//! assert_eq!(input.params.id, 7);
//! assert_eq!(input.query["page"], "2");
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::schema::{Schema, ValidationDiagnostic, Validator};

/// An input slot: absent, or a validator plus a decode target.
pub trait Slot: Send + Sync + 'static {
    /// What the handler receives for this slot.
    type Output: Send + 'static;

    /// Validates and decodes a raw value.
    fn decode(&self, raw: Value) -> Result<Self::Output, ValidationDiagnostic>;

    /// Returns the schema document, or `None` when the slot is absent.
    fn document(&self) -> Option<Value>;
}

/// The response slot. Always present.
pub trait ResponseSlot: Send + Sync + 'static {
    /// What the handler must produce.
    type Value: Send + 'static;

    /// Serializes and validates a handler result.
    fn encode(&self, value: Self::Value) -> Result<Value, ValidationDiagnostic>;

    /// Returns the schema document.
    fn response_document(&self) -> Value;
}

/// A slot with no schema. Passes the raw value through unvalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Absent;

impl Slot for Absent {
    type Output = Value;

    fn decode(&self, raw: Value) -> Result<Value, ValidationDiagnostic> {
        Ok(raw)
    }

    fn document(&self) -> Option<Value> {
        None
    }
}

/// A slot backed by a [`Validator`] and decoded into `T`.
///
/// On input, the validator runs first and the decoded value is then
/// deserialized into `T`; on output, `T` is serialized and the result
/// validated. Use `T = serde_json::Value` for a validated but untyped slot.
pub struct Typed<T, V = Schema> {
    validator: V,
    _target: PhantomData<fn() -> T>,
}

impl<T, V: Validator> Typed<T, V> {
    /// Creates a slot from a validator.
    #[must_use]
    pub const fn new(validator: V) -> Self {
        Self {
            validator,
            _target: PhantomData,
        }
    }

    /// Returns the validator.
    #[must_use]
    pub const fn validator(&self) -> &V {
        &self.validator
    }
}

impl<T, V: Clone> Clone for Typed<T, V> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            _target: PhantomData,
        }
    }
}

impl<T, V: fmt::Debug> fmt::Debug for Typed<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("target", &std::any::type_name::<T>())
            .field("validator", &self.validator)
            .finish()
    }
}

impl<T, V> Slot for Typed<T, V>
where
    T: DeserializeOwned + Send + 'static,
    V: Validator,
{
    type Output = T;

    fn decode(&self, raw: Value) -> Result<T, ValidationDiagnostic> {
        let decoded = self.validator.validate(&raw)?;
        serde_json::from_value(decoded)
            .map_err(|e| ValidationDiagnostic::single("$", format!("cannot decode value: {e}")))
    }

    fn document(&self) -> Option<Value> {
        Some(self.validator.document())
    }
}

impl<T, V> ResponseSlot for Typed<T, V>
where
    T: Serialize + Send + 'static,
    V: Validator,
{
    type Value = T;

    fn encode(&self, value: T) -> Result<Value, ValidationDiagnostic> {
        let raw = serde_json::to_value(&value)
            .map_err(|e| ValidationDiagnostic::single("$", format!("cannot encode value: {e}")))?;
        self.validator.validate(&raw)
    }

    fn response_document(&self) -> Value {
        self.validator.document()
    }
}

/// Creates a [`Typed`] slot decoding into `T` with the reference validator.
#[must_use]
pub const fn typed<T>(schema: Schema) -> Typed<T> {
    Typed::new(schema)
}

/// Creates a validated slot that keeps the value as raw JSON.
#[must_use]
pub const fn checked(schema: Schema) -> Typed<Value> {
    Typed::new(schema)
}

/// The validated input a handler body receives.
///
/// Each field is either the slot's decoded type or, for an absent slot, the
/// raw [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input<Q = Value, P = Value, B = Value> {
    /// Decoded query string.
    pub query: Q,
    /// Decoded path parameters.
    pub params: P,
    /// Decoded request body.
    pub body: B,
}

/// Input for a handler that only declares a body schema.
pub type BodyInput<B> = Input<Value, Value, B>;

/// Input for a handler that only declares a query schema.
pub type QueryInput<Q> = Input<Q, Value, Value>;

/// Input for a handler that only declares a path parameter schema.
pub type ParamsInput<P> = Input<Value, P, Value>;

/// The four slots of one handler.
///
/// Starts with every input slot [`Absent`]; each builder method swaps in one
/// slot and changes the corresponding type parameter.
#[derive(Debug, Clone)]
pub struct HandlerSchemas<Q = Absent, P = Absent, B = Absent, R = Typed<Value>> {
    query: Q,
    params: P,
    body: B,
    response: R,
}

impl<R: ResponseSlot> HandlerSchemas<Absent, Absent, Absent, R> {
    /// Creates a schema set with only the response slot filled.
    #[must_use]
    pub const fn new(response: R) -> Self {
        Self {
            query: Absent,
            params: Absent,
            body: Absent,
            response,
        }
    }
}

impl<Q, P, B, R> HandlerSchemas<Q, P, B, R> {
    /// Sets the query slot.
    #[must_use]
    pub fn query<S: Slot>(self, query: S) -> HandlerSchemas<S, P, B, R> {
        HandlerSchemas {
            query,
            params: self.params,
            body: self.body,
            response: self.response,
        }
    }

    /// Sets the path parameter slot.
    #[must_use]
    pub fn params<S: Slot>(self, params: S) -> HandlerSchemas<Q, S, B, R> {
        HandlerSchemas {
            query: self.query,
            params,
            body: self.body,
            response: self.response,
        }
    }

    /// Sets the body slot.
    #[must_use]
    pub fn body<S: Slot>(self, body: S) -> HandlerSchemas<Q, P, S, R> {
        HandlerSchemas {
            query: self.query,
            params: self.params,
            body,
            response: self.response,
        }
    }
}

/// Schema documents captured from a [`SchemaSet`] at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocuments {
    /// Query schema, if declared.
    pub query: Option<Value>,
    /// Path parameter schema, if declared.
    pub params: Option<Value>,
    /// Body schema, if declared.
    pub body: Option<Value>,
    /// Response schema.
    pub response: Value,
}

/// A complete set of slots, usable for registration.
///
/// Implemented for every [`HandlerSchemas`] whose slots are all valid.
pub trait SchemaSet: Send + Sync + 'static {
    /// Query slot.
    type Query: Slot;
    /// Path parameter slot.
    type Params: Slot;
    /// Body slot.
    type Body: Slot;
    /// Response slot.
    type Response: ResponseSlot;

    /// Returns the query slot.
    fn query_slot(&self) -> &Self::Query;
    /// Returns the path parameter slot.
    fn params_slot(&self) -> &Self::Params;
    /// Returns the body slot.
    fn body_slot(&self) -> &Self::Body;
    /// Returns the response slot.
    fn response_slot(&self) -> &Self::Response;

    /// Decodes raw inputs in the fixed order query, params, body.
    ///
    /// The first failing slot short-circuits with its own error class; later
    /// slots are not inspected.
    fn decode_input(
        &self,
        query: Value,
        params: Value,
        body: Value,
    ) -> Result<DerivedInput<Self>, ApiError>
    where
        Self: Sized,
    {
        let query = self
            .query_slot()
            .decode(query)
            .map_err(ApiError::invalid_query)?;
        let params = self
            .params_slot()
            .decode(params)
            .map_err(ApiError::invalid_params)?;
        let body = self
            .body_slot()
            .decode(body)
            .map_err(ApiError::invalid_body)?;
        Ok(Input {
            query,
            params,
            body,
        })
    }

    /// Captures the documents of every slot.
    fn documents(&self) -> SchemaDocuments {
        SchemaDocuments {
            query: self.query_slot().document(),
            params: self.params_slot().document(),
            body: self.body_slot().document(),
            response: self.response_slot().response_document(),
        }
    }
}

impl<Q, P, B, R> SchemaSet for HandlerSchemas<Q, P, B, R>
where
    Q: Slot,
    P: Slot,
    B: Slot,
    R: ResponseSlot,
{
    type Query = Q;
    type Params = P;
    type Body = B;
    type Response = R;

    fn query_slot(&self) -> &Q {
        &self.query
    }

    fn params_slot(&self) -> &P {
        &self.params
    }

    fn body_slot(&self) -> &B {
        &self.body
    }

    fn response_slot(&self) -> &R {
        &self.response
    }
}

/// The query type a schema set hands to its handler.
pub type QueryOf<S> = <<S as SchemaSet>::Query as Slot>::Output;

/// The path parameter type a schema set hands to its handler.
pub type ParamsOf<S> = <<S as SchemaSet>::Params as Slot>::Output;

/// The body type a schema set hands to its handler.
pub type BodyOf<S> = <<S as SchemaSet>::Body as Slot>::Output;

/// The response type a schema set's handler must produce.
pub type ResponseOf<S> = <<S as SchemaSet>::Response as ResponseSlot>::Value;

/// The input a schema set's handler receives.
pub type DerivedInput<S> = Input<QueryOf<S>, ParamsOf<S>, BodyOf<S>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorTag;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Params {
        id: i64,
    }

    #[derive(Debug, Serialize)]
    struct Item {
        name: String,
    }

    fn item_schema() -> Schema {
        Schema::object(vec![("name", Schema::string().required())])
    }

    fn params_schema() -> Schema {
        Schema::object(vec![("id", Schema::integer().from_string().required())])
    }

    #[test]
    fn test_absent_slot_passes_raw_value_through() {
        let raw = json!({ "anything": [1, "two", null] });
        assert_eq!(Absent.decode(raw.clone()).unwrap(), raw);
        assert!(Absent.document().is_none());
    }

    #[test]
    fn test_typed_slot_validates_then_decodes() {
        let slot = typed::<Params>(params_schema());
        assert_eq!(slot.decode(json!({ "id": "7" })).unwrap(), Params { id: 7 });

        let diag = slot.decode(json!({ "id": "abc" })).unwrap_err();
        assert_eq!(diag.issues()[0].path, "$.id");
        assert!(slot.document().is_some());
    }

    #[test]
    fn test_typed_slot_reports_deserialize_failure() {
        // Schema accepts any value but the target type needs an `id`.
        let slot = typed::<Params>(Schema::any());
        let diag = slot.decode(json!({ "other": 1 })).unwrap_err();
        assert!(diag.issues()[0].message.contains("cannot decode value"));
    }

    #[test]
    fn test_response_slot_serializes_then_validates() {
        let slot = typed::<Item>(item_schema());
        let encoded = slot
            .encode(Item {
                name: "widget".into(),
            })
            .unwrap();
        assert_eq!(encoded, json!({ "name": "widget" }));

        let checked_slot = checked(item_schema());
        let diag = checked_slot.encode(json!({ "name": 42 })).unwrap_err();
        assert_eq!(diag.issues()[0].path, "$.name");
    }

    #[test]
    fn test_decode_input_with_absent_slots() {
        let schemas = HandlerSchemas::new(checked(item_schema())).params(typed::<Params>(params_schema()));
        let input = schemas
            .decode_input(json!({ "q": "x" }), json!({ "id": "3" }), json!("raw body"))
            .unwrap();
        assert_eq!(input.query, json!({ "q": "x" }));
        assert_eq!(input.params, Params { id: 3 });
        assert_eq!(input.body, json!("raw body"));
    }

    #[test]
    fn test_decode_input_order_query_first() {
        let schemas = HandlerSchemas::new(checked(item_schema()))
            .query(checked(Schema::object(vec![("limit", Schema::integer().required())])))
            .params(typed::<Params>(params_schema()))
            .body(checked(item_schema()));

        // Every slot is invalid; query is reported.
        let err = schemas
            .decode_input(json!({}), json!({}), json!({}))
            .unwrap_err();
        assert_eq!(err.tag(), ErrorTag::InvalidQuery);

        // Query valid, params and body invalid; params is reported.
        let err = schemas
            .decode_input(json!({ "limit": 5 }), json!({}), json!({}))
            .unwrap_err();
        assert_eq!(err.tag(), ErrorTag::InvalidParams);

        let err = schemas
            .decode_input(json!({ "limit": 5 }), json!({ "id": 1 }), json!({}))
            .unwrap_err();
        assert_eq!(err.tag(), ErrorTag::InvalidBody);
    }

    #[test]
    fn test_documents_reflect_slot_presence() {
        let schemas = HandlerSchemas::new(checked(item_schema())).body(checked(item_schema()));
        let docs = schemas.documents();
        assert!(docs.query.is_none());
        assert!(docs.params.is_none());
        assert_eq!(docs.body, Some(item_schema().document()));
        assert_eq!(docs.response, item_schema().document());
    }

    #[test]
    fn test_derived_input_aliases() {
        type S = HandlerSchemas<Absent, Typed<Params>, Absent, Typed<Item>>;
        let input: DerivedInput<S> = Input {
            query: json!({}),
            params: Params { id: 1 },
            body: Value::Null,
        };
        let body: BodyOf<S> = input.body;
        let params: ParamsOf<S> = input.params;
        assert!(body.is_null());
        assert_eq!(params.id, 1);
    }
}
