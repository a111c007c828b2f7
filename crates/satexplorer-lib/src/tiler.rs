//! Client for the upstream tiler.
//!
//! Tile rendering, COG decoding and reprojection all happen in the tiler.
//! This module only forwards requests to it and asks it for dataset
//! footprints when assembling mosaics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::{redirect, Client, Method, StatusCode};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::mosaic::Footprint;
use crate::search::BBox;

const SERVICE: &str = "tiler";

/// Upper bound on `/cog/bounds` calls in flight for one mosaic.
pub const MAX_CONCURRENT_FOOTPRINTS: usize = 20;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Request to replay against the tiler.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path including the router prefix, e.g. `/cog/tiles/WebMercatorQuad/9/81/197`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Tiler answer relayed back to the caller.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    /// Whether the body is a JSON document (TileJSON, info, bounds, ...).
    pub fn is_json(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
    }

    /// Replace every occurrence of `from` with `to` in a JSON body.
    ///
    /// Used so TileJSON `tiles` templates point at this service instead of
    /// the tiler. Non-JSON and non-UTF-8 bodies are left untouched.
    pub fn rewrite_base(&mut self, from: &str, to: &str) {
        if from == to || !self.is_json() {
            return;
        }
        if let Ok(text) = std::str::from_utf8(&self.body) {
            if text.contains(from) {
                self.body = text.replace(from, to).into_bytes();
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct BoundsResponse {
    bounds: [f64; 4],
}

/// HTTP client bound to one tiler base URL.
#[derive(Debug, Clone)]
pub struct TilerClient {
    client: Client,
    base_url: String,
}

impl TilerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        // Redirects are relayed to the caller, never followed here.
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .user_agent(format!("satexplorer-lib/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Geographic bounds of the COG at `url`, as reported by the tiler.
    pub async fn footprint(&self, url: &str) -> Result<Footprint> {
        let response = self
            .client
            .get(format!("{}/cog/bounds", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "tiler could not read dataset bounds");
            return Err(Error::UpstreamStatus {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: BoundsResponse = response.json().await.map_err(|e| Error::UpstreamPayload {
            service: SERVICE,
            message: format!("bounds for {}: {}", url, e),
        })?;
        Ok(Footprint {
            url: url.to_string(),
            bounds: BBox::from(parsed.bounds),
        })
    }

    /// Resolve footprints for all `urls` concurrently, preserving input order.
    ///
    /// At most [`MAX_CONCURRENT_FOOTPRINTS`] lookups run at once.
    pub async fn footprints(&self, urls: &[String]) -> Result<Vec<Footprint>> {
        let limit = Arc::new(Semaphore::new(MAX_CONCURRENT_FOOTPRINTS));
        let mut tasks = JoinSet::new();
        for (index, url) in urls.iter().cloned().enumerate() {
            let permit = limit
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
            let tiler = self.clone();
            tasks.spawn(async move {
                let result = tiler.footprint(&url).await;
                drop(permit);
                (index, result)
            });
        }

        let mut resolved: Vec<Option<Footprint>> = vec![None; urls.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| Error::Task(e.to_string()))?;
            resolved[index] = Some(result?);
        }

        debug!(count = urls.len(), "resolved dataset footprints");
        resolved
            .into_iter()
            .map(|f| f.ok_or_else(|| Error::Task("footprint lookup did not complete".to_string())))
            .collect()
    }

    /// Replay `request` against the tiler and capture the answer.
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        let mut url = format!("{}{}", self.base_url, request.path);
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        debug!(method = %request.method, url = %url, "forwarding to tiler");

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(forwardable(&request.headers, true));
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }
        let response = builder.send().await?;

        let status = response.status();
        let headers = forwardable(response.headers(), false);
        let body = response.bytes().await?.to_vec();
        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}

/// Copy end-to-end headers, dropping hop-by-hop and length/host headers.
///
/// Outgoing requests additionally drop `accept-encoding` so bodies arrive
/// uncompressed and can be rewritten.
fn forwardable(headers: &HeaderMap, outgoing: bool) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if is_hop_by_hop(name)
            || name == header::CONTENT_LENGTH
            || name == header::HOST
            || (outgoing && name == header::ACCEPT_ENCODING)
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}
