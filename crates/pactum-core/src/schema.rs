//! Reference schema validator.
//!
//! [`Schema`] is the validator Pactum ships with. The rest of the crate only
//! talks to it through the [`Validator`] trait, so any other validation engine
//! can be plugged into a [`Typed`](crate::slot::Typed) slot instead.
//!
//! Validation *decodes*: the value handed back on success may differ from the
//! input. Path parameters and query strings arrive as strings, so numeric and
//! boolean schemas can opt into string coercion with
//! [`Schema::from_string`].
//!
//! # Example
//!
//! ```
//! use pactum_core::schema::{Schema, Validator};
//! use serde_json::json;
//!
//! let schema = Schema::object(vec![
//!     ("id", Schema::integer().from_string().required()),
//!     ("name", Schema::string().min_length(1)),
//! ]);
//!
//! let decoded = schema.validate(&json!({ "id": "7" })).unwrap();
//! assert_eq!(decoded, json!({ "id": 7 }));
//!
//! let diagnostic = schema.validate(&json!({ "id": "abc" })).unwrap_err();
//! assert_eq!(diagnostic.issues()[0].path, "$.id");
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A validation engine usable as a schema slot.
///
/// Implementations must be pure: the same input always yields the same
/// result, and `document` always yields the same description.
pub trait Validator: Send + Sync + 'static {
    /// Validates `value`, returning the decoded value on success.
    fn validate(&self, value: &Value) -> Result<Value, ValidationDiagnostic>;

    /// Returns a JSON Schema style description of the accepted shape.
    fn document(&self) -> Value;
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON path of the offending value (`$`, `$.name`, `$.items[2]`).
    pub path: String,
    /// What was wrong.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Structured result of a failed validation.
///
/// Carried as the cause of the `Invalid*` error variants and rendered as the
/// `details` of client error envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDiagnostic {
    issues: Vec<ValidationIssue>,
}

impl ValidationDiagnostic {
    /// Creates an empty diagnostic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a diagnostic holding one issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the collected issues in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns `true` if no issue was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => write!(f, "validation failed"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for ValidationDiagnostic {}

/// A schema describing an accepted JSON shape.
///
/// `required` applies to nested properties and items. The value at the root
/// of a slot is always required: it may be `null` only under
/// [`Schema::null`] or [`Schema::any`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// String type.
    String {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Minimum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        /// Maximum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// Integer type.
    Integer {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Minimum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        /// Maximum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
        /// Accept decimal strings and decode them to numbers.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        from_string: bool,
    },
    /// Number (float) type.
    Number {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Minimum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Maximum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
        /// Accept numeric strings and decode them to numbers.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        from_string: bool,
    },
    /// Boolean type.
    Boolean {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Accept `"true"` / `"false"` and decode them to booleans.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        from_string: bool,
    },
    /// Array type.
    Array {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Schema for array items.
        items: Box<Schema>,
        /// Minimum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// Object type. Properties not listed are passed through unchanged.
    Object {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Properties in declaration order.
        properties: IndexMap<String, Schema>,
        /// Names of properties that must be present.
        #[serde(default)]
        required_properties: Vec<String>,
    },
    /// Any value.
    Any {
        /// Whether a value must be present and non-null.
        #[serde(default)]
        required: bool,
    },
    /// Null only.
    Null,
}

impl Schema {
    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            required: false,
            min_length: None,
            max_length: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            required: false,
            minimum: None,
            maximum: None,
            from_string: false,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            required: false,
            minimum: None,
            maximum: None,
            from_string: false,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean {
            required: false,
            from_string: false,
        }
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            required: false,
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from `(name, schema)` pairs.
    ///
    /// Properties built with [`required`](Self::required) become required
    /// properties of the object.
    #[must_use]
    pub fn object(properties: Vec<(&str, Schema)>) -> Self {
        let required_properties = properties
            .iter()
            .filter(|(_, schema)| schema.is_required())
            .map(|(name, _)| (*name).to_string())
            .collect();

        Self::Object {
            required: false,
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            required_properties,
        }
    }

    /// Creates a schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::Any { required: false }
    }

    /// Creates a null schema.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Marks this schema as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        match &mut self {
            Self::String { required, .. }
            | Self::Integer { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required, .. }
            | Self::Array { required, .. }
            | Self::Object { required, .. }
            | Self::Any { required } => *required = true,
            Self::Null => {}
        }
        self
    }

    /// Returns whether this schema is marked as required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        match self {
            Self::String { required, .. }
            | Self::Integer { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required, .. }
            | Self::Array { required, .. }
            | Self::Object { required, .. }
            | Self::Any { required } => *required,
            Self::Null => false,
        }
    }

    /// Lets integer, number, and boolean schemas accept string encodings.
    ///
    /// Has no effect on other schema kinds.
    #[must_use]
    pub fn from_string(mut self) -> Self {
        match &mut self {
            Self::Integer { from_string, .. }
            | Self::Number { from_string, .. }
            | Self::Boolean { from_string, .. } => *from_string = true,
            _ => {}
        }
        self
    }

    /// Sets the minimum length for string schemas.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Self::String { min_length, .. } = &mut self {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length for string schemas.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Self::String { max_length, .. } = &mut self {
            *max_length = Some(len);
        }
        self
    }

    /// Sets the minimum value for integer schemas.
    #[must_use]
    pub fn minimum_int(mut self, min: i64) -> Self {
        if let Self::Integer { minimum, .. } = &mut self {
            *minimum = Some(min);
        }
        self
    }

    /// Sets the maximum value for integer schemas.
    #[must_use]
    pub fn maximum_int(mut self, max: i64) -> Self {
        if let Self::Integer { maximum, .. } = &mut self {
            *maximum = Some(max);
        }
        self
    }

    /// Sets the minimum items for array schemas.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Self::Array { min_items, .. } = &mut self {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum items for array schemas.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Self::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    const fn accepts_null_root(&self) -> bool {
        matches!(self, Self::Null | Self::Any { .. })
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Boolean { .. } => "boolean",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Any { .. } => "any",
            Self::Null => "null",
        }
    }

    fn decode_at(&self, value: &Value, path: &str, issues: &mut ValidationDiagnostic) -> Value {
        if value.is_null() {
            if self.is_required() {
                issues.push(ValidationIssue::new(path, "required value is null"));
            }
            return Value::Null;
        }

        match self {
            Self::String {
                min_length,
                max_length,
                ..
            } => {
                let Some(s) = value.as_str() else {
                    issues.push(mismatch(path, "string", value));
                    return value.clone();
                };
                let len = s.chars().count();
                if let Some(min) = min_length {
                    if len < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("string length {len} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("string length {len} is greater than maximum {max}"),
                        ));
                    }
                }
                value.clone()
            }

            Self::Integer {
                minimum,
                maximum,
                from_string,
                ..
            } => {
                let parsed = match value {
                    Value::String(s) if *from_string => s.trim().parse::<i64>().ok(),
                    other => other.as_i64(),
                };
                let Some(n) = parsed else {
                    issues.push(mismatch(path, "integer", value));
                    return value.clone();
                };
                if let Some(min) = minimum {
                    if n < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {n} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {n} is greater than maximum {max}"),
                        ));
                    }
                }
                Value::from(n)
            }

            Self::Number {
                minimum,
                maximum,
                from_string,
                ..
            } => {
                let parsed = match value {
                    Value::String(s) if *from_string => {
                        s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
                    }
                    other => other.as_f64(),
                };
                let Some(n) = parsed else {
                    issues.push(mismatch(path, "number", value));
                    return value.clone();
                };
                if let Some(min) = minimum {
                    if n < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {n} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {n} is greater than maximum {max}"),
                        ));
                    }
                }
                if value.is_number() {
                    value.clone()
                } else {
                    json!(n)
                }
            }

            Self::Boolean { from_string, .. } => match value {
                Value::Bool(_) => value.clone(),
                Value::String(s) if *from_string && s == "true" => Value::Bool(true),
                Value::String(s) if *from_string && s == "false" => Value::Bool(false),
                other => {
                    issues.push(mismatch(path, "boolean", other));
                    value.clone()
                }
            },

            Self::Array {
                items,
                min_items,
                max_items,
                ..
            } => {
                let Some(arr) = value.as_array() else {
                    issues.push(mismatch(path, "array", value));
                    return value.clone();
                };
                if let Some(min) = min_items {
                    if arr.len() < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("array length {} is less than minimum {min}", arr.len()),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if arr.len() > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("array length {} is greater than maximum {max}", arr.len()),
                        ));
                    }
                }
                let decoded = arr
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| items.decode_at(item, &format!("{path}[{idx}]"), issues))
                    .collect();
                Value::Array(decoded)
            }

            Self::Object {
                properties,
                required_properties,
                ..
            } => {
                let Some(obj) = value.as_object() else {
                    issues.push(mismatch(path, "object", value));
                    return value.clone();
                };
                for name in required_properties {
                    if !obj.contains_key(name) {
                        issues.push(ValidationIssue::new(
                            format!("{path}.{name}"),
                            format!("missing required property '{name}'"),
                        ));
                    }
                }
                let mut decoded = obj.clone();
                for (name, schema) in properties {
                    if let Some(prop) = obj.get(name) {
                        let prop = schema.decode_at(prop, &format!("{path}.{name}"), issues);
                        decoded.insert(name.clone(), prop);
                    }
                }
                Value::Object(decoded)
            }

            Self::Any { .. } => value.clone(),

            Self::Null => {
                issues.push(mismatch(path, "null", value));
                value.clone()
            }
        }
    }

    fn describe(&self) -> Value {
        let mut doc = Map::new();
        match self {
            Self::String {
                min_length,
                max_length,
                ..
            } => {
                doc.insert("type".into(), json!("string"));
                if let Some(min) = min_length {
                    doc.insert("minLength".into(), json!(min));
                }
                if let Some(max) = max_length {
                    doc.insert("maxLength".into(), json!(max));
                }
            }
            Self::Integer {
                minimum, maximum, ..
            } => {
                doc.insert("type".into(), json!("integer"));
                if let Some(min) = minimum {
                    doc.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    doc.insert("maximum".into(), json!(max));
                }
            }
            Self::Number {
                minimum, maximum, ..
            } => {
                doc.insert("type".into(), json!("number"));
                if let Some(min) = minimum {
                    doc.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    doc.insert("maximum".into(), json!(max));
                }
            }
            Self::Boolean { .. } => {
                doc.insert("type".into(), json!("boolean"));
            }
            Self::Array {
                items,
                min_items,
                max_items,
                ..
            } => {
                doc.insert("type".into(), json!("array"));
                doc.insert("items".into(), items.describe());
                if let Some(min) = min_items {
                    doc.insert("minItems".into(), json!(min));
                }
                if let Some(max) = max_items {
                    doc.insert("maxItems".into(), json!(max));
                }
            }
            Self::Object {
                properties,
                required_properties,
                ..
            } => {
                doc.insert("type".into(), json!("object"));
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.describe()))
                    .collect();
                doc.insert("properties".into(), Value::Object(props));
                if !required_properties.is_empty() {
                    doc.insert("required".into(), json!(required_properties));
                }
            }
            Self::Any { .. } => {}
            Self::Null => {
                doc.insert("type".into(), json!("null"));
            }
        }
        Value::Object(doc)
    }
}

impl Validator for Schema {
    fn validate(&self, value: &Value) -> Result<Value, ValidationDiagnostic> {
        let mut issues = ValidationDiagnostic::new();
        // The root is always required; only null and any schemas admit null there.
        let decoded = if value.is_null() && !self.accepts_null_root() {
            issues.push(mismatch("$", self.type_name(), value));
            Value::Null
        } else {
            self.decode_at(value, "$", &mut issues)
        };
        if issues.is_empty() {
            Ok(decoded)
        } else {
            Err(issues)
        }
    }

    fn document(&self) -> Value {
        self.describe()
    }
}

fn mismatch(path: &str, expected: &str, value: &Value) -> ValidationIssue {
    ValidationIssue::new(
        path,
        format!("expected {expected}, got {}", value_type_name(value)),
    )
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
