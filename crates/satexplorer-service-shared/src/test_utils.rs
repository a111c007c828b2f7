//! Test utilities for handler testing.
//!
//! Handlers talk to a STAC API and a tiler over HTTP, so tests stand up
//! small axum routers on ephemeral ports and point the state at them.

use std::time::Duration;

use axum::Router;
use satexplorer_lib::{MosaicStore, Settings, StacClient, TilerClient};

use crate::state::AppState;

/// Settings aimed at the given upstreams with a short timeout.
pub fn test_settings(stac_url: &str, tiler_url: &str) -> Settings {
    Settings {
        stac_api_url: stac_url.trim_end_matches('/').to_string(),
        tiler_url: tiler_url.trim_end_matches('/').to_string(),
        http_timeout: Duration::from_secs(5),
        ..Settings::default()
    }
}

/// AppState with an empty mosaic store wired to the given upstreams.
///
/// # Panics
///
/// Panics if the HTTP clients cannot be built.
pub fn test_state(stac_url: &str, tiler_url: &str) -> AppState {
    let settings = test_settings(stac_url, tiler_url);
    let stac = StacClient::new(
        settings.stac_api_url.clone(),
        settings.collections(),
        settings.http_timeout,
    )
    .unwrap_or_else(|e| panic!("failed to build STAC client: {}", e));
    let tiler = TilerClient::new(settings.tiler_url.clone(), settings.http_timeout)
        .unwrap_or_else(|e| panic!("failed to build tiler client: {}", e));
    AppState::from_components(settings, stac, tiler, MosaicStore::new())
}

/// Serve `router` on 127.0.0.1 and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("failed to bind test upstream: {}", e));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("test upstream has no address: {}", e));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
