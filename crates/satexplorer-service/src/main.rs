//! Satellite Data Explorer HTTP API binary.
//!
//! # Configuration
//!
//! - `STAC_API_URL` - STAC API root (default: Earth Search v1)
//! - `DEFAULT_COLLECTIONS` - comma-separated collection ids (default: sentinel-2-l2a)
//! - `CORS_ORIGINS` - comma-separated browser origins
//! - `TILER_URL` - upstream tiler root (default: http://127.0.0.1:8081)
//! - `PUBLIC_BASE_URL` - public URL of this service, for TileJSON rewriting
//! - `HTTP_TIMEOUT_SECS` - upstream timeout (default: 30)
//! - `SERVICE_PORT` - HTTP port (default: 8000)
//! - `METRICS_ENABLED` - `false` disables the Prometheus recorder
//! - `RUST_LOG` / `LOG_FORMAT` - log filter and format (json or text)

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use satexplorer_lib::Settings;
use satexplorer_service::build_router;
use satexplorer_service_shared::{init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig};

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("satexplorer");
    init_logging(&logging_config)?;

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "continuing without metrics");
    }

    let settings = Settings::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        e
    })?;
    let port: u16 = match env::var("SERVICE_PORT") {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            error!(value = %raw, "SERVICE_PORT is not a valid port");
            format!("SERVICE_PORT '{}' is not a valid port", raw)
        })?,
        Err(_) => DEFAULT_PORT,
    };

    info!(
        stac_api_url = %settings.stac_api_url,
        tiler_url = %settings.tiler_url,
        public_base_url = settings.public_base_url.as_deref().unwrap_or("-"),
        port = port,
        "starting satexplorer service"
    );

    let state = AppState::from_settings(settings).map_err(|e| {
        error!(error = %e, "failed to build application state");
        e
    })?;

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
