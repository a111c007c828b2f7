use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use tracing::{error, info};

use satexplorer_service_shared::{
    from_lib_error, record_search_completed, record_search_failed, AppState, ProblemDetails,
    RequestId, SearchQuery, SearchResults,
};

/// Handle `GET /search`.
///
/// The query is taken as raw pairs because `bbox` may be repeated.
pub async fn search(
    State(state): State<AppState>,
    request_id: RequestId,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<SearchResults, ProblemDetails> {
    let Query(pairs) = query.map_err(|rejection| {
        record_search_failed("validation_error");
        ProblemDetails::bad_request(rejection.body_text(), request_id.as_str())
    })?;

    let params = SearchQuery::from_pairs(pairs)
        .to_params(request_id.as_str())
        .map_err(|problem| {
            record_search_failed("validation_error");
            *problem
        })?;

    info!(
        request_id = %request_id,
        bbox = ?params.bbox.to_array(),
        start = %params.start,
        end = %params.end,
        cloud_max = params.cloud_max,
        limit = params.limit,
        "handling search request"
    );

    let results = state.stac().search(&params).await.map_err(|e| {
        error!(request_id = %request_id, error = %e, "STAC search failed");
        let reason = if e.is_timeout() {
            "upstream_timeout"
        } else {
            "upstream_error"
        };
        record_search_failed(reason);
        from_lib_error(&e, request_id.as_str())
    })?;

    record_search_completed(results.len());
    info!(request_id = %request_id, results = results.len(), "search completed");

    Ok(SearchResults { results })
}
