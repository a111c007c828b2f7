//! Shared infrastructure for the Satellite Data Explorer HTTP service.
//!
//! - [`AppState`]: STAC client, tiler client and mosaic registry shared by handlers
//! - [`health`]: `/health`, liveness and readiness handlers
//! - [`ProblemDetails`]: RFC 9457 Problem Details for consistent error responses
//! - [`SearchResults`], [`MosaicCreated`] and [`HealthOk`] payloads
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: Structured JSON logging setup
//! - [`middleware`]: Request ids and HTTP metrics
//! - [`cors_layer`]: CORS policy for the browser client
//! - Request types with validation for each endpoint
//!
//! # Architecture
//!
//! Handlers stay thin; search, mosaic assembly and tiler access live in
//! `satexplorer-lib`. This crate provides only HTTP glue:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse query string / JSON body                           │
//! │  - Validate parameters                                      │
//! │  - Call satexplorer-lib APIs                                │
//! │  - Format response                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module builds state against in-process fake upstreams.
//! Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

mod cors;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cors::cors_layer;
pub use health::{health_live, health_ok, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_mosaic_created, record_mosaic_lookup,
    record_search_completed, record_search_failed, record_tiler_request, MetricsConfig,
    MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_MOSAIC_NOT_FOUND, PROBLEM_UPSTREAM_ERROR, PROBLEM_UPSTREAM_TIMEOUT,
};
pub use request::{MosaicCreateRequest, SearchQuery, Validate};
pub use response::{HealthOk, MosaicCreated, SearchResults};
pub use state::{AppState, AppStateError, DEFAULT_SERVICE_NAME};
