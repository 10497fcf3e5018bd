//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to install the metrics recorder or exporter.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to install the log subscriber.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The metrics listener address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MetricsInit("recorder already installed".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to initialize metrics: recorder already installed"
        );
    }

    #[test]
    fn test_invalid_address_display() {
        let err = TelemetryError::InvalidAddress("not-an-addr".to_string());
        assert!(err.to_string().contains("not-an-addr"));
    }
}
