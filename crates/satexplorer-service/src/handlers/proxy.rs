use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use satexplorer_lib::ProxyRequest;
use satexplorer_service_shared::{from_lib_error, record_tiler_request, AppState, RequestId};

/// Relay any `/cog/*` or `/mosaic/*` request to the tiler unchanged.
///
/// Tiler error statuses pass through as-is. Only transport failures become
/// problem documents (502, or 504 on timeout). When `PUBLIC_BASE_URL` is set,
/// tiler URLs inside JSON bodies are rewritten to point back here.
pub async fn proxy_tiler(
    State(state): State<AppState>,
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let prefix = if path.starts_with("/mosaic/") {
        "mosaic"
    } else {
        "cog"
    };

    debug!(request_id = %request_id, method = %method, path = %path, "proxying to tiler");

    let request = ProxyRequest {
        method,
        path,
        query: uri.query().map(String::from),
        headers,
        body: body.to_vec(),
    };

    let mut upstream = match state.tiler().forward(request).await {
        Ok(response) => response,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "tiler request failed");
            let problem = from_lib_error(&e, request_id.as_str());
            record_tiler_request(prefix, problem.status);
            return problem.into_response();
        }
    };

    record_tiler_request(prefix, upstream.status.as_u16());

    if let Some(public) = state.settings().public_base_url.as_deref() {
        upstream.rewrite_base(state.tiler().base_url(), public);
    }

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = upstream.headers;
    response
}
