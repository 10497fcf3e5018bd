//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

use pactum_core::api::{DEFAULT_TITLE, DEFAULT_VERSION};
use pactum_core::ApiBuilder;
use pactum_docs::OpenApiGenerator;
use pactum_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};

/// A server the API is reachable at, listed in the OpenAPI document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    /// Base URL (e.g., `https://api.example.com`).
    pub url: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

/// API metadata section.
///
/// Names the aggregate and feeds the OpenAPI generator.
///
/// # Example
///
/// ```
/// use pactum_config::ApiSection;
///
/// let section = ApiSection {
///     title: "Catalogue".to_string(),
///     version: "1.2.0".to_string(),
///     ..Default::default()
/// };
/// let api = section.api_builder().build();
/// assert_eq!(api.title(), "Catalogue");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// API title.
    #[serde(default = "default_title")]
    pub title: String,

    /// API version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Longer description for the OpenAPI `info` block.
    #[serde(default)]
    pub description: Option<String>,

    /// Servers listed in the OpenAPI document.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            description: None,
            servers: Vec::new(),
        }
    }
}

impl ApiSection {
    /// Starts an aggregate named after this section.
    #[must_use]
    pub fn api_builder(&self) -> ApiBuilder {
        pactum_core::Api::builder(&self.title, &self.version)
    }

    /// Creates an OpenAPI generator carrying this section's metadata.
    #[must_use]
    pub fn openapi_generator(&self) -> OpenApiGenerator {
        let generator = OpenApiGenerator::new()
            .title(&self.title)
            .version(&self.version);
        let generator = match &self.description {
            Some(description) => generator.description(description),
            None => generator,
        };
        self.servers.iter().fold(generator, |generator, server| {
            generator.server(&server.url, server.description.clone())
        })
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts the section into the subscriber configuration.
    #[must_use]
    pub fn to_log_config(&self, service_name: &str) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            file_line_info: self.include_location,
            service_name: service_name.to_string(),
            ..base
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Scrape listener address; unset records without serving.
    #[serde(default)]
    pub addr: Option<String>,

    /// Histogram bucket boundaries for handler duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

impl MetricsSection {
    /// Converts the section into the recorder configuration.
    #[must_use]
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
            duration_buckets: self.histogram_buckets.clone(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name recorded on log events.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment (e.g., "development", "staging", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            logging: LoggingSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Converts the section into the configuration `init_telemetry` takes.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(&self.service_name)
            .environment(&self.environment)
            .logging(self.logging.to_log_config(&self.service_name))
            .metrics(self.metrics.to_metrics_config())
            .build()
    }
}

fn default_service_name() -> String {
    "pactum".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_section_defaults() {
        let section = ApiSection::default();
        assert_eq!(section.title, "API");
        assert_eq!(section.version, "0.0.0");
        assert!(section.servers.is_empty());
    }

    #[test]
    fn test_api_section_partial_toml() {
        let section: ApiSection = toml::from_str(r#"title = "Catalogue""#).unwrap();
        assert_eq!(section.title, "Catalogue");
        assert_eq!(section.version, "0.0.0");
    }

    #[test]
    fn test_api_section_rejects_unknown_fields() {
        let result: Result<ApiSection, _> = toml::from_str(r#"titel = "Catalogue""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_openapi_generator_carries_metadata() {
        let section = ApiSection {
            title: "Catalogue".to_string(),
            version: "2.0.0".to_string(),
            description: Some("Items for sale".to_string()),
            servers: vec![ServerEntry {
                url: "https://api.example.com".to_string(),
                description: Some("production".to_string()),
            }],
        };
        let spec = section.api_builder().build().specification();
        let doc = section.openapi_generator().generate(&spec).unwrap();

        assert_eq!(doc.info.title, "Catalogue");
        assert_eq!(doc.info.version, "2.0.0");
        assert_eq!(doc.info.description.as_deref(), Some("Items for sale"));
        assert_eq!(doc.servers.len(), 1);
        assert_eq!(doc.servers[0].url, "https://api.example.com");
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingSection {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
            ..Default::default()
        };
        let config = section.to_log_config("catalogue");
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.file_line_info);
        assert_eq!(config.service_name, "catalogue");
    }

    #[test]
    fn test_to_metrics_config() {
        let section = MetricsSection {
            enabled: true,
            addr: Some("127.0.0.1:9464".to_string()),
            histogram_buckets: vec![0.1, 1.0],
        };
        let config = section.to_metrics_config();
        assert_eq!(config.addr.as_deref(), Some("127.0.0.1:9464"));
        assert_eq!(config.duration_buckets, vec![0.1, 1.0]);
    }

    #[test]
    fn test_to_telemetry_config() {
        let section = TelemetrySection {
            service_name: "catalogue".to_string(),
            environment: "production".to_string(),
            ..Default::default()
        };
        let config = section.to_telemetry_config();
        assert_eq!(config.service_name, "catalogue");
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.service_name, "catalogue");
        assert!(config.logging.is_json());
    }
}
