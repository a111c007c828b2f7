//! Health check handlers.
//!
//! `/health` is the plain probe the browser client polls; `/health/live` and
//! `/health/ready` return richer JSON for container orchestrators.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, HealthOk};

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Number of mosaics in the registry (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mosaics_stored: Option<usize>,

    /// STAC collections searched by default (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            mosaics_stored: None,
            collections: None,
        }
    }

    pub fn ready(service: &str, version: &str, mosaics: usize, collections: Vec<String>) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            mosaics_stored: Some(mosaics),
            collections: Some(collections),
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            service: service.to_string(),
            version: version.to_string(),
            mosaics_stored: None,
            collections: None,
        }
    }
}

/// `GET /health`
///
/// ```text
/// {"ok":true}
/// ```
pub async fn health_ok() -> Json<HealthOk> {
    Json(HealthOk { ok: true })
}

/// Liveness probe handler.
///
/// Returns 200 OK whenever the process is serving requests. Upstreams are
/// not contacted.
pub async fn health_live(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus::alive(state.service_name(), state.service_version());
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"satexplorer-service","version":"0.1.0","mosaics_stored":2,"collections":["sentinel-2-l2a"]}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = state.service_name();
    let version = state.service_version();

    let collections = state.stac().collections().to_vec();
    if collections.is_empty() {
        let status = HealthStatus::not_ready(service, version, "no STAC collections configured");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, state.mosaics().len(), collections);
    (StatusCode::OK, Json(status)).into_response()
}
