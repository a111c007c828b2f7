//! Success payloads returned by the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use satexplorer_lib::SearchRecord;

/// `GET /search` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchRecord>,
}

/// `POST /mosaics` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicCreated {
    /// Identifier to pass to `GET /mosaics/{id}`.
    pub id: String,
}

/// `GET /health` payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthOk {
    pub ok: bool,
}

impl IntoResponse for SearchResults {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl IntoResponse for MosaicCreated {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_results_serialize_under_results_key() {
        let value = serde_json::to_value(SearchResults { results: vec![] }).unwrap();
        assert_eq!(value, json!({ "results": [] }));
    }

    #[test]
    fn mosaic_created_round_trips() {
        let created: MosaicCreated = serde_json::from_str(r#"{"id":"0b7c"}"#).unwrap();
        assert_eq!(created.id, "0b7c");
    }

    #[test]
    fn into_response_is_ok_json() {
        let response = MosaicCreated {
            id: "abc".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn health_ok_shape() {
        let value = serde_json::to_value(HealthOk { ok: true }).unwrap();
        assert_eq!(value, json!({ "ok": true }));
    }
}
