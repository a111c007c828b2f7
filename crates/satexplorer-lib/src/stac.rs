//! Async client for STAC API item search.
//!
//! The client posts an item-search request, follows `rel=next` pagination
//! links, and reduces each returned item to a compact [`SearchRecord`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::search::SearchParams;

const SERVICE: &str = "stac";

/// Hard stop on pagination so a misbehaving catalog cannot loop forever.
const MAX_PAGES: usize = 20;

/// Compact record returned for each matching catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: String,
    pub datetime: Option<String>,
    pub cloud_cover: Option<f64>,
    pub bbox: Option<Vec<f64>>,
    pub geometry: Value,
    /// Href of the best preview asset: `visual`, then `thumbnail`, then the first asset.
    pub asset_href: Option<String>,
}

impl SearchRecord {
    /// Reduce a STAC item document to a compact record.
    pub fn from_item(item: &Value) -> Result<Self> {
        let id = item
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UpstreamPayload {
                service: SERVICE,
                message: "item without an 'id'".to_string(),
            })?
            .to_string();

        let empty = Map::new();
        let props = item
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let assets = item
            .get("assets")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let preview = assets
            .get("visual")
            .or_else(|| assets.get("thumbnail"))
            .or_else(|| assets.values().next());

        Ok(Self {
            id,
            datetime: props
                .get("datetime")
                .and_then(Value::as_str)
                .map(String::from),
            cloud_cover: props.get("eo:cloud_cover").and_then(Value::as_f64),
            bbox: item.get("bbox").and_then(|b| {
                b.as_array()
                    .map(|vals| vals.iter().filter_map(Value::as_f64).collect())
            }),
            geometry: item.get("geometry").cloned().unwrap_or(Value::Null),
            asset_href: preview
                .and_then(|a| a.get("href"))
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

/// How to fetch the next page of results.
#[derive(Debug, Clone, PartialEq)]
enum PageRequest {
    Get { href: String },
    Post { href: String, body: Value },
}

/// Client for a single STAC API root.
#[derive(Debug, Clone)]
pub struct StacClient {
    client: Client,
    api_url: String,
    collections: Vec<String>,
}

impl StacClient {
    /// Create a client for `api_url` searching `collections`.
    pub fn new(
        api_url: impl Into<String>,
        collections: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            collections,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Item-search request body for `params`.
    pub fn search_body(&self, params: &SearchParams) -> Value {
        json!({
            "bbox": params.bbox.to_array(),
            "collections": self.collections,
            "datetime": params.datetime_range(),
            "limit": params.limit,
            "query": { "eo:cloud_cover": { "lte": params.cloud_max } },
            "sortby": [ { "field": "properties.datetime", "direction": "desc" } ],
        })
    }

    /// Search the catalog, newest first, returning at most `params.limit` records.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<SearchRecord>> {
        let mut request = PageRequest::Post {
            href: format!("{}/search", self.api_url),
            body: self.search_body(params),
        };
        let mut records = Vec::new();

        for page_number in 1..=MAX_PAGES {
            let page = self.fetch_page(&request).await?;
            let features = page
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::UpstreamPayload {
                    service: SERVICE,
                    message: "search response has no 'features' array".to_string(),
                })?;

            debug!(page = page_number, items = features.len(), "received search page");

            for item in features.iter().take(params.limit - records.len()) {
                records.push(SearchRecord::from_item(item)?);
            }

            if records.len() >= params.limit || features.is_empty() {
                break;
            }

            match next_page(&page, &request) {
                Some(next) => request = next,
                None => break,
            }
        }

        info!(
            collections = ?self.collections,
            datetime = %params.datetime_range(),
            results = records.len(),
            "stac search completed"
        );
        Ok(records)
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Value> {
        let response = match request {
            PageRequest::Get { href } => self.client.get(href).send().await?,
            PageRequest::Post { href, body } => self.client.post(href).json(body).send().await?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Resolve the `rel=next` link of `page`, if any.
fn next_page(page: &Value, previous: &PageRequest) -> Option<PageRequest> {
    let link = page
        .get("links")?
        .as_array()?
        .iter()
        .find(|l| l.get("rel").and_then(Value::as_str) == Some("next"))?;
    let href = link.get("href")?.as_str()?.to_string();
    let method = link
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("GET")
        .to_ascii_uppercase();

    if method != "POST" {
        return Some(PageRequest::Get { href });
    }

    let previous_body = match previous {
        PageRequest::Post { body, .. } => body.clone(),
        PageRequest::Get { .. } => Value::Object(Map::new()),
    };
    let merge = link.get("merge").and_then(Value::as_bool).unwrap_or(false);
    let body = match link.get("body") {
        Some(Value::Object(fields)) if merge => {
            let mut merged = previous_body;
            if let Value::Object(target) = &mut merged {
                for (k, v) in fields {
                    target.insert(k.clone(), v.clone());
                }
            }
            merged
        }
        Some(body) => body.clone(),
        None => previous_body,
    };
    Some(PageRequest::Post { href, body })
}

fn user_agent() -> String {
    format!("satexplorer-lib/{}", env!("CARGO_PKG_VERSION"))
}
