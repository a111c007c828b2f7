//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Provides structured error responses following the Problem Details standard.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use satexplorer_lib::Error as LibError;

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for unknown mosaic ids.
pub const PROBLEM_MOSAIC_NOT_FOUND: &str = "/problems/mosaic-not-found";

/// Problem type URI for failures reported by the STAC API or the tiler.
pub const PROBLEM_UPSTREAM_ERROR: &str = "/problems/upstream-error";

/// Problem type URI for upstream calls that did not answer in time.
pub const PROBLEM_UPSTREAM_TIMEOUT: &str = "/problems/upstream-timeout";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details response structure.
///
/// # Example
///
/// ```
/// use satexplorer_service_shared::{ProblemDetails, PROBLEM_MOSAIC_NOT_FOUND};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_MOSAIC_NOT_FOUND,
///     "Mosaic Not Found",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("mosaic not found")
/// .with_request_id("req-12345");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request identifier of the failing call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Content type for this response (always "application/problem+json").
    pub content_type: String,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            content_type: "application/problem+json".to_string(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 400 for malformed query parameters or bodies.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404 for a mosaic id that is not in the store.
    pub fn mosaic_not_found(request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_MOSAIC_NOT_FOUND,
            "Mosaic Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail("mosaic not found")
        .with_request_id(request_id)
    }

    /// 502 when the STAC API or the tiler failed.
    pub fn upstream_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_ERROR,
            "Upstream Error",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 504 when an upstream call timed out.
    pub fn upstream_timeout(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_TIMEOUT,
            "Upstream Timeout",
            StatusCode::GATEWAY_TIMEOUT,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        *response.status_mut() = status;
        response
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::InvalidBbox
        | LibError::InvalidBboxValue { .. }
        | LibError::InvalidDateRange { .. }
        | LibError::InvalidZoom { .. }
        | LibError::EmptyUrls
        | LibError::MosaicTooLarge { .. } => {
            ProblemDetails::bad_request(error.to_string(), request_id)
        }
        LibError::MosaicNotFound { .. } => ProblemDetails::mosaic_not_found(request_id),
        e if e.is_timeout() => ProblemDetails::upstream_timeout(e.to_string(), request_id),
        e if e.is_upstream() => ProblemDetails::upstream_error(e.to_string(), request_id),
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(
            PROBLEM_MOSAIC_NOT_FOUND,
            "Mosaic Not Found",
            StatusCode::NOT_FOUND,
        );
        assert_eq!(problem.type_uri, PROBLEM_MOSAIC_NOT_FOUND);
        assert_eq!(problem.status, 404);
        assert_eq!(problem.content_type, "application/problem+json");
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::bad_request("urls cannot be empty", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"title\":\"Invalid Request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"detail\":\"urls cannot be empty\""));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_into_response_sets_status_and_content_type() {
        let response = ProblemDetails::upstream_error("tiler down", "req-1").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/problem+json"
        );
    }

    #[test]
    fn test_from_lib_error_validation_is_bad_request() {
        let problem = from_lib_error(&LibError::InvalidBbox, "req-lib");
        assert_eq!(problem.status, 400);
        assert_eq!(
            problem.detail.as_deref(),
            Some("bbox must have 4 numeric values (minx,miny,maxx,maxy)")
        );

        let problem = from_lib_error(&LibError::EmptyUrls, "req-lib");
        assert_eq!(problem.detail.as_deref(), Some("urls cannot be empty"));
    }

    #[test]
    fn test_from_lib_error_not_found() {
        let problem = from_lib_error(
            &LibError::MosaicNotFound {
                id: "abc".to_string(),
            },
            "req-404",
        );
        assert_eq!(problem.status, 404);
        assert_eq!(problem.type_uri, PROBLEM_MOSAIC_NOT_FOUND);
        assert_eq!(problem.detail.as_deref(), Some("mosaic not found"));
    }

    #[test]
    fn test_from_lib_error_upstream() {
        let error = LibError::UpstreamStatus {
            service: "stac",
            status: 500,
            body: "boom".to_string(),
        };
        let problem = from_lib_error(&error, "req-up");
        assert_eq!(problem.status, 502);
        assert!(problem.detail.as_deref().unwrap().contains("stac returned HTTP 500"));

        let problem = from_lib_error(&LibError::Task("panicked".into()), "req-task");
        assert_eq!(problem.status, 500);
    }
}
