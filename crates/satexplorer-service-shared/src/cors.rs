//! CORS policy for the browser client.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build the CORS layer for the configured origins.
///
/// Credentials are allowed, so methods and headers mirror the preflight
/// request instead of using `*`. An origin of `*` mirrors any origin.
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer<S: AsRef<str>>(origins: &[S]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o.as_ref() == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.as_ref()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = origin.as_ref(), "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
