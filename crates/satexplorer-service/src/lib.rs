//! Satellite Data Explorer HTTP API.
//!
//! # Endpoints
//!
//! - `GET /health` - `{"ok": true}`
//! - `GET /health/live` / `GET /health/ready` - container probes
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /search` - STAC item search by bbox, date range and cloud cover
//! - `POST /mosaics` - build a MosaicJSON document from COG URLs
//! - `GET /mosaics/{id}` - fetch a stored MosaicJSON document
//! - `/cog/*`, `/mosaic/*` - any method, relayed to the upstream tiler

#![deny(warnings)]

mod handlers;

use axum::{
    routing::{any, get, post},
    Router,
};

use satexplorer_service_shared::{
    cors_layer, health_live, health_ok, health_ready, metrics_handler, AppState, MetricsLayer,
};

pub use handlers::{create_mosaic, get_mosaic, proxy_tiler, search};

/// Assemble the full application router over `state`.
///
/// Health probes report this crate's name and version.
pub fn build_router(state: AppState) -> Router {
    let state = state.with_service(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let cors = cors_layer(&state.settings().cors_origin_list());

    Router::new()
        .route("/health", get(health_ok))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/metrics", get(metrics_handler))
        .route("/search", get(search))
        .route("/mosaics", post(create_mosaic))
        .route("/mosaics/{id}", get(get_mosaic))
        .route("/cog/{*path}", any(proxy_tiler))
        .route("/mosaic/{*path}", any(proxy_tiler))
        .layer(cors)
        .layer(MetricsLayer)
        .with_state(state)
}
