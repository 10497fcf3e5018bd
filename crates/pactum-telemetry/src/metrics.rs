//! Prometheus metrics for Pactum.
//!
//! Handler contracts record through the `metrics` facade; this module
//! installs the Prometheus recorder those records land in.
//!
//! # Handler Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `pactum_handler_outcomes_total` | Counter | `method`, `path`, `outcome` | Finished executions |
//! | `pactum_handler_duration_seconds` | Histogram | `method`, `path` | Execution latency |
//! | `pactum_handler_cancelled_total` | Counter | `method`, `path` | Cancelled executions |
//!
//! `outcome` is `ok` or the error code of the failure (e.g. `INVALID_BODY`).

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use pactum_core::{CANCELLED_METRIC, DURATION_METRIC, OUTCOMES_METRIC};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address of the scrape listener (e.g., "0.0.0.0:9090").
    ///
    /// `None` installs the recorder only; scrape it with [`render_metrics`].
    pub addr: Option<String>,

    /// Histogram buckets for handler duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Parses the listener address, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidAddress` if the address does not parse.
    pub fn listener_addr(&self) -> TelemetryResult<Option<SocketAddr>> {
        self.addr
            .as_deref()
            .map(|addr| {
                addr.parse()
                    .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))
            })
            .transpose()
    }
}

/// Builds a recorder configured with the handler duration buckets.
///
/// Does not install anything globally.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are rejected.
pub fn prometheus_builder(config: &MetricsConfig) -> TelemetryResult<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(DURATION_METRIC.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Installs the global Prometheus recorder.
///
/// With a listener address the scrape endpoint is served on the current
/// Tokio runtime, so this must then be called from within one.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed or no
/// runtime is available for the listener.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if METRICS_HANDLE.get().is_some() {
        return Err(TelemetryError::MetricsInit(
            "metrics recorder already installed".to_string(),
        ));
    }

    let listener = config.listener_addr()?;
    let builder = prometheus_builder(config)?;

    let handle = match listener {
        Some(addr) => {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let (recorder, exporter) = {
                let _guard = runtime.enter();
                builder
                    .with_http_listener(addr)
                    .build()
                    .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
            };
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            runtime.spawn(async move {
                if let Err(err) = exporter.await {
                    tracing::error!(error = ?err, "metrics listener stopped");
                }
            });
            tracing::info!(addr = %addr, "metrics listener started");
            handle
        }
        None => builder
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?,
    };

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::debug!("metrics handle already set, keeping the first one");
    }
    describe_handler_metrics();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the handler metrics on the current recorder.
pub fn describe_handler_metrics() {
    describe_counter!(
        OUTCOMES_METRIC,
        Unit::Count,
        "Handler executions that finished, by outcome"
    );
    describe_histogram!(
        DURATION_METRIC,
        Unit::Seconds,
        "Handler execution duration in seconds"
    );
    describe_counter!(
        CANCELLED_METRIC,
        Unit::Count,
        "Handler executions abandoned through cancellation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_core::fixtures::{items_api, RecordingWriter};
    use http::Method;
    use pactum_core::RawRequest;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config.addr.is_none());
        assert!(!config.duration_buckets.is_empty());
    }

    #[test]
    fn test_listener_addr() {
        let mut config = MetricsConfig::default();
        assert_eq!(config.listener_addr().unwrap(), None);

        config.addr = Some("127.0.0.1:9464".to_string());
        assert_eq!(
            config.listener_addr().unwrap(),
            Some("127.0.0.1:9464".parse().unwrap())
        );

        config.addr = Some("localhost".to_string());
        assert!(matches!(
            config.listener_addr(),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            addr: Some("not an address".to_string()),
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            duration_buckets: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            prometheus_builder(&config),
            Err(TelemetryError::MetricsInit(_))
        ));
    }

    #[test]
    fn test_handler_executions_are_recorded() {
        let recorder = prometheus_builder(&MetricsConfig::default())
            .unwrap()
            .build_recorder();
        let handle = recorder.handle();
        let api = items_api();

        metrics::with_local_recorder(&recorder, || {
            describe_handler_metrics();
            tokio_test::block_on(async {
                let mut writer = RecordingWriter::new();
                let ok = RawRequest::new(Method::GET, "/items/:id")
                    .with_params(json!({ "id": "1" }));
                api.dispatch(ok, &mut writer).await.unwrap();

                let missing = RawRequest::new(Method::GET, "/items/:id")
                    .with_params(json!({ "id": "99" }));
                assert!(api.dispatch(missing, &mut writer).await.is_err());
            });
        });

        let rendered = handle.render();
        assert!(rendered.contains("# HELP pactum_handler_outcomes_total"));
        let outcomes: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with("pactum_handler_outcomes_total{"))
            .collect();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|line| line.contains(r#"path="/items/{id}""#)));
        assert!(outcomes.iter().any(|line| line.contains(r#"outcome="ok""#)));
        assert!(outcomes.iter().any(|line| line.contains(r#"outcome="NOT_FOUND""#)));
        assert!(rendered.contains("pactum_handler_duration_seconds_bucket"));
    }
}
