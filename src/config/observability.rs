//! Observability sections of the config file.

use serde::Deserialize;

/// `[observability]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilitySettings {
    /// `[observability.logging]`.
    pub logging: Option<LoggingSettings>,
    /// `[observability.metrics]`.
    pub metrics: Option<MetricsSettings>,
}

/// `[observability.logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `info` or `stacksort=debug`.
    pub level: Option<String>,
    /// Log file path (stderr when absent).
    pub file: Option<String>,
}

/// `[observability.metrics]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether to install the Prometheus recorder.
    pub enabled: Option<bool>,
    /// Port for the Prometheus scrape listener.
    pub port: Option<u16>,
}
