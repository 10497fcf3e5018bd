//! Main configuration types.
//!
//! This module provides the top-level [`PactumConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ApiSection, ConfigError, LogFormat, TelemetrySection};

/// Complete Pactum service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use pactum_config::PactumConfig;
///
/// let config = PactumConfig::default();
/// assert_eq!(config.api.title, "API");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PactumConfig {
    /// API metadata.
    #[serde(default)]
    pub api: ApiSection,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl PactumConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> PactumConfigBuilder {
        PactumConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field:
    /// - empty API title or version, or a server with an empty URL
    /// - a log level that is not a valid filter directive
    /// - an unparsable metrics address while metrics are enabled
    /// - empty or unsorted histogram buckets
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.title.trim().is_empty() {
            return Err(ConfigError::invalid_value("api.title", "must not be empty"));
        }
        if self.api.version.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "api.version",
                "must not be empty",
            ));
        }
        if let Some(index) = self.api.servers.iter().position(|s| s.url.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                format!("api.servers[{index}].url"),
                "must not be empty",
            ));
        }

        let logging = &self.telemetry.logging;
        if let Err(err) = pactum_telemetry::logging::create_env_filter(&logging.level) {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                err.to_string(),
            ));
        }

        let metrics = &self.telemetry.metrics;
        if metrics.enabled {
            if let Err(err) = metrics.to_metrics_config().listener_addr() {
                return Err(ConfigError::invalid_value(
                    "telemetry.metrics.addr",
                    err.to_string(),
                ));
            }
        }
        if metrics.histogram_buckets.is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.histogram_buckets",
                "must not be empty",
            ));
        }
        if !metrics.histogram_buckets.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.histogram_buckets",
                "must be strictly increasing",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty logs at `debug` with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use pactum_config::PactumConfig;
    ///
    /// let config = PactumConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config.telemetry.environment = "development".to_string();
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at `info`.
    ///
    /// # Example
    ///
    /// ```
    /// use pactum_config::{LogFormat, PactumConfig};
    ///
    /// let config = PactumConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.include_location = false;
        config.telemetry.environment = "production".to_string();
        config
    }
}

/// Builder for [`PactumConfig`].
#[derive(Debug, Default)]
pub struct PactumConfigBuilder {
    api: Option<ApiSection>,
    telemetry: Option<TelemetrySection>,
}

impl PactumConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API section.
    #[must_use]
    pub fn api(mut self, api: ApiSection) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> PactumConfig {
        PactumConfig {
            api: self.api.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<PactumConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
