mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use satexplorer_lib::{BBox, Error, SearchParams, StacClient};

type Captured = Arc<Mutex<Vec<Value>>>;

fn feature(id: &str, cloud: f64) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "bbox": [-122.5, 37.5, -122.0, 38.0],
        "geometry": { "type": "Point", "coordinates": [-122.25, 37.75] },
        "properties": { "datetime": "2025-02-01T00:00:00Z", "eo:cloud_cover": cloud },
        "assets": { "visual": { "href": format!("https://cogs.example.com/{id}/TCI.tif") } }
    })
}

async fn paged_search(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured.lock().unwrap().push(body.clone());
    let host = headers
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
        .to_string();

    if body.get("token").is_none() {
        Json(json!({
            "type": "FeatureCollection",
            "features": [feature("a", 1.0), feature("b", 2.0)],
            "links": [{
                "rel": "next",
                "href": format!("http://{host}/search"),
                "method": "POST",
                "body": { "token": "page-2" },
                "merge": true
            }]
        }))
    } else {
        Json(json!({
            "type": "FeatureCollection",
            "features": [feature("c", 3.0), feature("d", 4.0)],
            "links": []
        }))
    }
}

async fn stac_with_pages() -> (StacClient, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/search", post(paged_search))
        .with_state(captured.clone());
    let base = common::spawn_upstream(router).await;
    let client = StacClient::new(
        base,
        vec!["sentinel-2-l2a".to_string()],
        Duration::from_secs(5),
    )
    .unwrap();
    (client, captured)
}

fn params(limit: usize) -> SearchParams {
    SearchParams::new(
        BBox::new(-123.1, 37.3, -121.7, 38.2),
        "2025-01-01".parse().unwrap(),
        "2025-02-28".parse().unwrap(),
        20,
        limit,
    )
    .unwrap()
}

#[tokio::test]
async fn search_sends_filters_and_follows_next_links() {
    let (client, captured) = stac_with_pages().await;

    let records = client.search(&params(3)).await.expect("search succeeds");
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(
        records[0].asset_href.as_deref(),
        Some("https://cogs.example.com/a/TCI.tif")
    );

    let bodies = captured.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);

    let first = &bodies[0];
    assert_eq!(first["bbox"], json!([-123.1, 37.3, -121.7, 38.2]));
    assert_eq!(first["collections"], json!(["sentinel-2-l2a"]));
    assert_eq!(first["datetime"], "2025-01-01/2025-02-28");
    assert_eq!(first["limit"], 3);
    assert_eq!(first["query"]["eo:cloud_cover"]["lte"], 20);
    assert_eq!(first["sortby"][0]["field"], "properties.datetime");
    assert_eq!(first["sortby"][0]["direction"], "desc");

    // The next-page body is merged onto the original request.
    assert_eq!(bodies[1]["token"], "page-2");
    assert_eq!(bodies[1]["datetime"], "2025-01-01/2025-02-28");
}

#[tokio::test]
async fn search_stops_once_limit_is_reached() {
    let (client, captured) = stac_with_pages().await;

    let records = client.search(&params(2)).await.expect("search succeeds");
    assert_eq!(records.len(), 2);
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn upstream_failure_is_reported_with_status() {
    let router = Router::new().route(
        "/search",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "catalog offline") }),
    );
    let base = common::spawn_upstream(router).await;
    let client = StacClient::new(base, vec![], Duration::from_secs(5)).unwrap();

    let err = client.search(&params(5)).await.unwrap_err();
    match err {
        Error::UpstreamStatus {
            service,
            status,
            body,
        } => {
            assert_eq!(service, "stac");
            assert_eq!(status, 503);
            assert_eq!(body, "catalog offline");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn response_without_features_is_rejected() {
    let router = Router::new().route("/search", post(|| async { Json(json!({ "links": [] })) }));
    let base = common::spawn_upstream(router).await;
    let client = StacClient::new(base, vec![], Duration::from_secs(5)).unwrap();

    let err = client.search(&params(5)).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamPayload { service: "stac", .. }));
}

#[tokio::test]
async fn non_json_page_is_a_json_error() {
    let router = Router::new().route(
        "/search",
        post(|| async { (StatusCode::OK, "<html>gateway splash</html>") }),
    );
    let base = common::spawn_upstream(router).await;
    let client = StacClient::new(base, vec![], Duration::from_secs(5)).unwrap();

    let err = client.search(&params(5)).await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
    assert!(err.is_upstream());
}
