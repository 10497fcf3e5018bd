//! Typed configuration for Pactum services.
//!
//! This crate loads the settings a Pactum service needs around its handler
//! contracts:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`PactumConfig`] has two sections:
//!
//! - [`ApiSection`] - API title, version and servers; builds the aggregate
//!   and the OpenAPI generator
//! - [`TelemetrySection`] - logging and metrics, converted into the
//!   `pactum-telemetry` configuration
//!
//! # Example
//!
//! ```no_run
//! use pactum_config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("pactum.toml")?
//!     .with_env_prefix("PACTUM")
//!     .load()?;
//!
//! pactum_telemetry::init_telemetry(&config.telemetry.to_telemetry_config())?;
//! let api = config.api.api_builder().build();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! title = "Catalogue"
//! version = "1.0.0"
//! description = "Items for sale"
//!
//! [[api.servers]]
//! url = "https://api.example.com"
//!
//! [telemetry]
//! service_name = "catalogue"
//! environment = "production"
//!
//! [telemetry.logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9464"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form `PREFIX__SECTION__KEY`:
//!
//! - `PACTUM__API__TITLE=Catalogue`
//! - `PACTUM__API__SERVERS=https://a.example.com,https://b.example.com`
//! - `PACTUM__TELEMETRY__LOGGING__LEVEL=debug`
//! - `PACTUM__TELEMETRY__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{PactumConfig, PactumConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use pactum_telemetry::LogFormat;
pub use schema::{ApiSection, LoggingSection, MetricsSection, ServerEntry, TelemetrySection};
