mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Method;
use serde_json::json;

use satexplorer_lib::tiler::MAX_CONCURRENT_FOOTPRINTS;
use satexplorer_lib::{Error, MosaicJson, MosaicOptions, ProxyRequest, TilerClient};

async fn bounds(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    match query.get("url").map(String::as_str) {
        Some("https://cogs.example.com/west.tif") => {
            Json(json!({ "bounds": [-123.0, 37.0, -122.0, 38.0], "crs": "EPSG:4326" }))
                .into_response()
        }
        Some("https://cogs.example.com/east.tif") => {
            Json(json!({ "bounds": [-122.0, 37.0, -121.0, 38.0], "crs": "EPSG:4326" }))
                .into_response()
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "cannot open dataset").into_response(),
    }
}

async fn tilejson(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "tilejson": "2.2.0",
        "tiles": [format!("http://{host}/cog/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}@1x?url={}", query["url"])],
        "saw_accept_encoding": headers.contains_key(header::ACCEPT_ENCODING),
    }))
}

async fn tiler() -> TilerClient {
    let router = Router::new()
        .route("/cog/bounds", get(bounds))
        .route("/cog/WebMercatorQuad/tilejson.json", get(tilejson))
        .route("/cog/old", get(|| async { Redirect::temporary("/cog/new") }))
        .route("/cog/new", get(|| async { "followed" }));
    let base = common::spawn_upstream(router).await;
    TilerClient::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn footprints_resolve_in_request_order() {
    let tiler = tiler().await;
    let urls = vec![
        "https://cogs.example.com/east.tif".to_string(),
        "https://cogs.example.com/west.tif".to_string(),
    ];

    let footprints = tiler.footprints(&urls).await.expect("footprints resolve");
    assert_eq!(footprints[0].url, urls[0]);
    assert_eq!(footprints[0].bounds.to_array(), [-122.0, 37.0, -121.0, 38.0]);
    assert_eq!(footprints[1].url, urls[1]);

    let mosaic = MosaicJson::from_footprints(&footprints, MosaicOptions::default()).unwrap();
    assert_eq!(mosaic.bounds.to_array(), [-123.0, 37.0, -121.0, 38.0]);
    assert!(mosaic.quadkey_count() > 0);
    assert!(mosaic.tiles.keys().all(|k| k.len() == 12));
}

#[tokio::test]
async fn unreadable_dataset_fails_the_batch() {
    let tiler = tiler().await;
    let urls = vec![
        "https://cogs.example.com/west.tif".to_string(),
        "https://cogs.example.com/missing.tif".to_string(),
    ];

    let err = tiler.footprints(&urls).await.unwrap_err();
    assert!(matches!(
        err,
        Error::UpstreamStatus {
            service: "tiler",
            status: 500,
            ..
        }
    ));
}

#[tokio::test]
async fn forward_relays_query_and_rewrites_json() {
    let tiler = tiler().await;
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_ENCODING,
        reqwest::header::HeaderValue::from_static("gzip"),
    );

    let mut response = tiler
        .forward(ProxyRequest {
            method: Method::GET,
            path: "/cog/WebMercatorQuad/tilejson.json".to_string(),
            query: Some("url=s3.tif".to_string()),
            headers,
            body: Vec::new(),
        })
        .await
        .expect("forward succeeds");

    assert_eq!(response.status, reqwest::StatusCode::OK);
    assert!(response.is_json());

    let base = tiler.base_url().to_string();
    response.rewrite_base(&base, "https://maps.example.com");
    let doc: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(
        doc["tiles"][0],
        "https://maps.example.com/cog/tiles/WebMercatorQuad/{z}/{x}/{y}@1x?url=s3.tif"
    );
    assert_eq!(doc["saw_accept_encoding"], false);
}

#[tokio::test]
async fn forward_passes_through_error_status() {
    let tiler = tiler().await;
    let response = tiler
        .forward(ProxyRequest {
            method: Method::GET,
            path: "/cog/does-not-exist".to_string(),
            query: None,
            headers: reqwest::header::HeaderMap::new(),
            body: Vec::new(),
        })
        .await
        .expect("forward succeeds even when the tiler answers 404");
    assert_eq!(response.status.as_u16(), 404);
}

#[tokio::test]
async fn forward_relays_redirects_without_following() {
    let tiler = tiler().await;
    let response = tiler
        .forward(ProxyRequest {
            method: Method::GET,
            path: "/cog/old".to_string(),
            query: None,
            headers: reqwest::header::HeaderMap::new(),
            body: Vec::new(),
        })
        .await
        .expect("forward succeeds");

    assert_eq!(response.status, reqwest::StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers[reqwest::header::LOCATION], "/cog/new");
    assert_ne!(response.body, b"followed");
}

#[derive(Clone, Default)]
struct InFlight {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

async fn slow_bounds(State(in_flight): State<InFlight>) -> Json<serde_json::Value> {
    let now = in_flight.current.fetch_add(1, Ordering::SeqCst) + 1;
    in_flight.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    in_flight.current.fetch_sub(1, Ordering::SeqCst);
    Json(json!({ "bounds": [-123.0, 37.0, -122.0, 38.0] }))
}

#[tokio::test]
async fn footprint_lookups_are_bounded() {
    let in_flight = InFlight::default();
    let router = Router::new()
        .route("/cog/bounds", get(slow_bounds))
        .with_state(in_flight.clone());
    let base = common::spawn_upstream(router).await;
    let tiler = TilerClient::new(base, Duration::from_secs(10)).unwrap();

    let urls: Vec<String> = (0..MAX_CONCURRENT_FOOTPRINTS * 3)
        .map(|i| format!("https://cogs.example.com/{i}.tif"))
        .collect();
    let footprints = tiler.footprints(&urls).await.expect("footprints resolve");

    assert_eq!(footprints.len(), urls.len());
    assert!(footprints.iter().zip(&urls).all(|(f, u)| &f.url == u));
    let peak = in_flight.peak.load(Ordering::SeqCst);
    assert!(
        peak <= MAX_CONCURRENT_FOOTPRINTS,
        "{peak} lookups ran at once"
    );
}
