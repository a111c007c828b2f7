//! Prometheus metrics for the Satellite Data Explorer service.
//!
//! - [`MetricsConfig`]: whether the recorder is installed
//! - [`init_metrics`]: install the Prometheus recorder
//! - [`metrics_handler`]: axum handler for `/metrics`
//! - Business counters for searches, mosaics and tiler traffic
//!
//! # Example
//!
//! ```no_run
//! use satexplorer_service_shared::metrics::{init_metrics, metrics_handler, MetricsConfig};
//! use axum::{routing::get, Router};
//!
//! init_metrics(&MetricsConfig::default()).expect("failed to initialize metrics");
//! let app: Router = Router::new().route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// `METRICS_ENABLED=false` turns the recorder off; anything else keeps it on.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| v.trim().to_lowercase() != "false")
            .unwrap_or(true);
        Self { enabled }
    }
}

/// Install the Prometheus recorder.
///
/// Must run once at startup before anything is recorded. A second call
/// returns [`MetricsError::AlreadyInitialized`].
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Returns `None` until [`init_metrics`] has succeeded.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Increments `satexplorer_searches_total` and records the result count.
pub fn record_search_completed(results: usize) {
    metrics::counter!("satexplorer_searches_total", "outcome" => "ok").increment(1);
    metrics::histogram!("satexplorer_search_results").record(results as f64);
}

/// Increments `satexplorer_searches_total` with a failure reason
/// ("validation_error", "upstream_error", "upstream_timeout").
pub fn record_search_failed(reason: &str) {
    metrics::counter!(
        "satexplorer_searches_total",
        "outcome" => "error",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Increments `satexplorer_mosaics_created_total` and records how many COGs
/// and quadkeys the new document holds.
pub fn record_mosaic_created(assets: usize, quadkeys: usize) {
    metrics::counter!("satexplorer_mosaics_created_total").increment(1);
    metrics::histogram!("satexplorer_mosaic_assets").record(assets as f64);
    metrics::histogram!("satexplorer_mosaic_quadkeys").record(quadkeys as f64);
    metrics::gauge!("satexplorer_mosaics_stored").increment(1.0);
}

/// Increments `satexplorer_mosaic_lookups_total` labelled by hit/miss.
pub fn record_mosaic_lookup(found: bool) {
    let result = if found { "hit" } else { "miss" };
    metrics::counter!("satexplorer_mosaic_lookups_total", "result" => result).increment(1);
}

/// Increments `satexplorer_tiler_requests_total`.
///
/// `prefix` is "cog" or "mosaic"; `status` is the tiler's status code, or
/// 502/504 when the tiler could not be reached.
pub fn record_tiler_request(prefix: &str, status: u16) {
    metrics::counter!(
        "satexplorer_tiler_requests_total",
        "prefix" => prefix.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
