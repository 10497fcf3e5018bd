//! Route identity.
//!
//! A route is identified by its HTTP method and path template. Templates may
//! spell parameters either as `:id` or as `{id}`; both normalize to `{id}`, so
//! `GET /items/:id` and `GET /items/{id}` are the same route.

use std::fmt;
use std::hash::{Hash, Hasher};

use http::Method;
use thiserror::Error;

/// Methods a contract may be registered for.
pub const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
    Method::PATCH,
    Method::TRACE,
];

/// Errors raised when a contract is registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The path was empty.
    #[error("route path must not be empty")]
    EmptyPath,

    /// The path did not start with `/`.
    #[error("route path `{path}` must start with '/'")]
    MissingLeadingSlash {
        /// The offending path.
        path: String,
    },

    /// A path segment is not a literal or a well-formed parameter.
    #[error("route path `{path}` has an invalid segment `{segment}`")]
    InvalidSegment {
        /// The offending path.
        path: String,
        /// The offending segment.
        segment: String,
    },

    /// The method is not one of [`SUPPORTED_METHODS`].
    #[error("unsupported method `{method}`")]
    UnsupportedMethod {
        /// The offending method.
        method: String,
    },
}

/// Method plus normalized path template.
///
/// Equality and hashing use the normalized template; [`path`](Self::path)
/// keeps the spelling used at registration.
#[derive(Debug, Clone)]
pub struct RouteKey {
    method: Method,
    path: String,
    template: String,
}

impl RouteKey {
    /// Validates and normalizes a method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Result<Self, ContractError> {
        let path = path.into();
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(ContractError::UnsupportedMethod {
                method: method.to_string(),
            });
        }
        let template = normalize_path(&path)?;
        Ok(Self {
            method,
            path,
            template,
        })
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path as registered.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the path with every parameter spelled `{name}`.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the parameter names in order of appearance.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.template
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
    }
}

impl PartialEq for RouteKey {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.template == other.template
    }
}

impl Eq for RouteKey {}

impl Hash for RouteKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.template.hash(state);
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

/// Normalizes a path template to the `{name}` parameter spelling.
///
/// # Errors
///
/// Fails when the path is empty, lacks a leading `/`, or contains a
/// malformed parameter segment.
pub fn normalize_path(path: &str) -> Result<String, ContractError> {
    if path.is_empty() {
        return Err(ContractError::EmptyPath);
    }
    if !path.starts_with('/') {
        return Err(ContractError::MissingLeadingSlash {
            path: path.to_string(),
        });
    }

    let invalid = |segment: &str| ContractError::InvalidSegment {
        path: path.to_string(),
        segment: segment.to_string(),
    };

    let mut segments = Vec::new();
    for segment in path.split('/') {
        let name = if let Some(name) = segment.strip_prefix(':') {
            Some(name)
        } else if let Some(inner) = segment.strip_prefix('{') {
            Some(inner.strip_suffix('}').ok_or_else(|| invalid(segment))?)
        } else {
            None
        };

        match name {
            Some(name) if is_parameter_name(name) => segments.push(format!("{{{name}}}")),
            Some(_) => return Err(invalid(segment)),
            None if segment.contains(['{', '}', ':']) || segment.chars().any(char::is_whitespace) => {
                return Err(invalid(segment));
            }
            None => segments.push(segment.to_string()),
        }
    }
    Ok(segments.join("/"))
}

fn is_parameter_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
