//! OpenAPI document types and generation.
//!
//! This module provides types that represent the parts of the OpenAPI 3.1
//! document Pactum emits, and a generator that renders a
//! [`Specification`](pactum_core::Specification) into one.
//!
//! Schemas are carried as JSON values: every slot document in a
//! specification is already JSON Schema shaped, and OpenAPI 3.1 accepts
//! JSON Schema directly.
//!
//! ## OpenAPI 3.1 Compliance
//!
//! <https://spec.openapis.org/oas/v3.1.0>

use indexmap::IndexMap;
use pactum_core::route::normalize_path;
use pactum_core::{ErrorTag, RouteSpec, Specification};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DocsError, DocsResult};

/// OpenAPI version emitted by the generator.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// Name of the shared error envelope schema component.
pub const ERROR_ENVELOPE: &str = "ErrorEnvelope";

const JSON_MEDIA_TYPE: &str = "application/json";
const PATH_PARAMETER_PATTERN: &str = r"\{([A-Za-z0-9_]+)\}";

/// OpenAPI document root object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// OpenAPI version.
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Available servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths and operations.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Tags for API grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations available on a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Returns the operation slot for an upper-case method name.
    fn slot_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        match method {
            "GET" => Some(&mut self.get),
            "PUT" => Some(&mut self.put),
            "POST" => Some(&mut self.post),
            "DELETE" => Some(&mut self.delete),
            "OPTIONS" => Some(&mut self.options),
            "HEAD" => Some(&mut self.head),
            "PATCH" => Some(&mut self.patch),
            "TRACE" => Some(&mut self.trace),
            _ => None,
        }
    }

    /// Iterates the operations that are set.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
            &self.trace,
        ]
        .into_iter()
        .flatten()
    }
}

/// An API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Tags for grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code.
    pub responses: IndexMap<String, Response>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string parameter.
    Query,
    /// URL path parameter.
    Path,
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Parameter schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Content by media type.
    pub content: IndexMap<String, MediaType>,
}

/// Media type content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Response definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description (required by OpenAPI).
    pub description: String,
    /// Response content by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Reusable components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Reusable schemas.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Value>,
}

/// API tag for grouping operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
}

/// Renders a [`Specification`] as an OpenAPI document.
///
/// Title and version default to the specification's own; the builder
/// methods override them.
///
/// # Example
///
/// ```
/// use pactum_core::fixtures::items_api;
/// use pactum_docs::OpenApiGenerator;
///
/// let doc = OpenApiGenerator::new()
///     .description("Item catalogue")
///     .server("https://api.example.com", None)
///     .generate(&items_api().specification())
///     .unwrap();
///
/// assert_eq!(doc.info.title, "Items");
/// assert!(doc.paths.contains_key("/items/{id}"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenApiGenerator {
    title: Option<String>,
    version: Option<String>,
    description: Option<String>,
    servers: Vec<Server>,
}

impl OpenApiGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Generate an OpenAPI document from a specification.
    ///
    /// # Errors
    ///
    /// Fails if a route has a malformed path or an unknown method, which
    /// cannot happen for specifications derived from an [`Api`](pactum_core::Api).
    pub fn generate(&self, spec: &Specification) -> DocsResult<OpenApi> {
        let info = Info {
            title: self.title.clone().unwrap_or_else(|| spec.title.clone()),
            version: self.version.clone().unwrap_or_else(|| spec.version.clone()),
            description: self.description.clone(),
        };

        let param_pattern = Regex::new(PATH_PARAMETER_PATTERN)?;
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        let mut tags: IndexMap<String, ()> = IndexMap::new();
        let mut operation_ids: IndexMap<String, usize> = IndexMap::new();

        for route in &spec.routes {
            let template = normalize_path(&route.path).map_err(|e| DocsError::InvalidRoute {
                method: route.method.clone(),
                path: route.path.clone(),
                reason: e.to_string(),
            })?;

            let mut operation = convert_route(route, &template, &param_pattern);
            operation.operation_id = unique_id(&mut operation_ids, operation.operation_id);
            for tag in &operation.tags {
                tags.insert(tag.clone(), ());
            }

            let path_item = paths.entry(template).or_default();
            let slot = path_item
                .slot_mut(&route.method)
                .ok_or_else(|| DocsError::InvalidRoute {
                    method: route.method.clone(),
                    path: route.path.clone(),
                    reason: "unknown HTTP method".to_string(),
                })?;
            *slot = Some(operation);
        }

        let mut components = Components::default();
        components
            .schemas
            .insert(ERROR_ENVELOPE.to_string(), error_envelope_schema());

        Ok(OpenApi {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            servers: self.servers.clone(),
            paths,
            components: Some(components),
            tags: tags.into_keys().map(|name| Tag { name }).collect(),
        })
    }

    /// Generate the OpenAPI document as pretty-printed JSON.
    ///
    /// The output is identical for identical specifications.
    pub fn generate_json(&self, spec: &Specification) -> DocsResult<String> {
        let doc = self.generate(spec)?;
        serde_json::to_string_pretty(&doc).map_err(DocsError::from)
    }
}

fn convert_route(route: &RouteSpec, template: &str, param_pattern: &Regex) -> Operation {
    let mut parameters = path_parameters(template, route.params_schema.as_ref(), param_pattern);
    if let Some(query) = &route.query_schema {
        parameters.extend(query_parameters(query));
    }

    let request_body = route.body_schema.as_ref().map(|schema| RequestBody {
        required: true,
        content: json_content(schema.clone()),
    });

    let mut responses = IndexMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: "Successful response".to_string(),
            content: json_content(route.response_schema.clone()),
        },
    );
    let has_input = route.query_schema.is_some()
        || route.params_schema.is_some()
        || route.body_schema.is_some();
    if has_input {
        responses.insert("400".to_string(), error_response(&[
            ErrorTag::InvalidQuery,
            ErrorTag::InvalidParams,
            ErrorTag::InvalidBody,
        ]));
    }
    responses.insert("404".to_string(), error_response(&[ErrorTag::NotFound]));
    responses.insert(
        "500".to_string(),
        error_response(&[
            ErrorTag::InvalidResponse,
            ErrorTag::Server,
            ErrorTag::UnexpectedServer,
        ]),
    );

    Operation {
        operation_id: operation_id(&route.method, template),
        tags: first_literal_segment(template).into_iter().collect(),
        parameters,
        request_body,
        responses,
    }
}

fn json_content(schema: Value) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(
        JSON_MEDIA_TYPE.to_string(),
        MediaType {
            schema: Some(schema),
        },
    );
    content
}

fn error_response(tags: &[ErrorTag]) -> Response {
    let names: Vec<&str> = tags.iter().map(ErrorTag::tag_name).collect();
    Response {
        description: names.join(", "),
        content: json_content(json!({ "$ref": format!("#/components/schemas/{ERROR_ENVELOPE}") })),
    }
}

/// Path parameters in template order; schemas come from the params slot
/// when it declares the property.
fn path_parameters(template: &str, params_schema: Option<&Value>, pattern: &Regex) -> Vec<Parameter> {
    pattern
        .captures_iter(template)
        .filter_map(|cap| cap.get(1))
        .map(|name| {
            let name = name.as_str();
            let schema = params_schema
                .and_then(|schema| schema.get("properties"))
                .and_then(|props| props.get(name))
                .cloned()
                .unwrap_or_else(|| json!({ "type": "string" }));
            Parameter {
                name: name.to_string(),
                location: ParameterIn::Path,
                required: true,
                schema: Some(schema),
            }
        })
        .collect()
}

/// Expands an object-shaped query schema into one parameter per property.
fn query_parameters(query_schema: &Value) -> Vec<Parameter> {
    let required: Vec<&str> = query_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    query_schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| Parameter {
                    name: name.clone(),
                    location: ParameterIn::Query,
                    required: required.contains(&name.as_str()),
                    schema: Some(schema.clone()),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `GET /items/{id}` becomes `getItemsById`.
fn operation_id(method: &str, template: &str) -> String {
    let mut id = method.to_ascii_lowercase();
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(param) => {
                id.push_str("By");
                id.push_str(&capitalize(param));
            }
            None => id.push_str(&capitalize(segment)),
        }
    }
    id
}

fn capitalize(word: &str) -> String {
    word.split(['_', '-', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Suffixes `id` with the next free counter; generated ids are reserved too.
fn unique_id(seen: &mut IndexMap<String, usize>, id: String) -> String {
    let Some(&last) = seen.get(&id) else {
        seen.insert(id.clone(), 1);
        return id;
    };
    let mut suffix = last;
    loop {
        suffix += 1;
        let candidate = format!("{id}{suffix}");
        if !seen.contains_key(&candidate) {
            seen.insert(id, suffix);
            seen.insert(candidate.clone(), 1);
            return candidate;
        }
    }
}

fn first_literal_segment(template: &str) -> Option<String> {
    template
        .split('/')
        .find(|s| !s.is_empty() && !s.starts_with('{'))
        .map(str::to_string)
}

/// JSON Schema of [`pactum_core::ErrorEnvelope`].
fn error_envelope_schema() -> Value {
    let tags: Vec<&str> = ErrorTag::ALL.iter().map(ErrorTag::tag_name).collect();
    json!({
        "type": "object",
        "required": ["error"],
        "properties": {
            "error": {
                "type": "object",
                "required": ["_tag", "code", "message"],
                "properties": {
                    "_tag": { "type": "string", "enum": tags },
                    "code": { "type": "string" },
                    "message": { "type": "string" },
                    "details": {}
                }
            },
            "request_id": { "type": "string", "format": "uuid" }
        }
    })
}
