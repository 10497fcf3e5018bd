//! Logging and metrics for Pactum services.
//!
//! Handler contracts in `pactum-core` emit `tracing` events and record
//! through the `metrics` facade. This crate installs the subscriber and the
//! recorder that give those records somewhere to go:
//!
//! - **Logging**: JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: a Prometheus recorder, optionally with a scrape listener
//!
//! # Example
//!
//! ```rust,ignore
//! use pactum_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelemetryConfig::builder()
//!         .service_name("catalogue")
//!         .environment("production")
//!         .metrics_addr("0.0.0.0:9090")
//!         .build();
//!
//!     init_telemetry(&config)?;
//!     Ok(())
//! }
//! ```
//!
//! # Metrics Endpoint
//!
//! ```text
//! # TYPE pactum_handler_outcomes_total counter
//! pactum_handler_outcomes_total{method="GET",path="/items/{id}",outcome="ok"} 1234
//! pactum_handler_outcomes_total{method="GET",path="/items/{id}",outcome="NOT_FOUND"} 56
//! ```

#![doc(html_root_url = "https://docs.rs/pactum-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging, then metrics.
///
/// Both subsystems install process-wide state, so call this once at startup.
///
/// # Errors
///
/// Returns the first subsystem error.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service.name = %config.service_name,
        environment = %config.environment,
        metrics = config.metrics.enabled,
        "telemetry initialized"
    );

    Ok(())
}
