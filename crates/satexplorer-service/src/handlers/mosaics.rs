use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use satexplorer_lib::MosaicJson;
use satexplorer_service_shared::{
    from_lib_error, record_mosaic_created, record_mosaic_lookup, AppState, MosaicCreateRequest,
    MosaicCreated, ProblemDetails, RequestId, Validate,
};

/// Handle `POST /mosaics`.
///
/// Footprints come from the tiler; the quadkey index is built here and the
/// document is kept in the in-memory store.
pub async fn create_mosaic(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<MosaicCreateRequest>, JsonRejection>,
) -> Result<MosaicCreated, ProblemDetails> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(request_id = %request_id, error = %rejection, "rejected mosaic body");
        ProblemDetails::bad_request(rejection.body_text(), request_id.as_str())
    })?;

    request.validate(request_id.as_str()).map_err(|p| *p)?;

    info!(
        request_id = %request_id,
        urls = request.urls.len(),
        minzoom = request.minzoom,
        maxzoom = request.maxzoom,
        quadkey_zoom = request.quadkey_zoom,
        "handling mosaic request"
    );

    let footprints = state.tiler().footprints(&request.urls).await.map_err(|e| {
        error!(request_id = %request_id, error = %e, "footprint lookup failed");
        from_lib_error(&e, request_id.as_str())
    })?;

    let mosaic = MosaicJson::from_footprints(&footprints, request.options())
        .map_err(|e| from_lib_error(&e, request_id.as_str()))?;

    let quadkeys = mosaic.quadkey_count();
    let id = state.mosaics().insert(mosaic);
    record_mosaic_created(request.urls.len(), quadkeys);

    info!(request_id = %request_id, mosaic_id = %id, quadkeys, "mosaic stored");

    Ok(MosaicCreated { id })
}

/// Handle `GET /mosaics/{id}`.
pub async fn get_mosaic(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(id): Path<String>,
) -> Response {
    match state.mosaics().get(&id) {
        Some(mosaic) => {
            record_mosaic_lookup(true);
            Json(mosaic.as_ref()).into_response()
        }
        None => {
            record_mosaic_lookup(false);
            info!(request_id = %request_id, mosaic_id = %id, "mosaic not found");
            ProblemDetails::mosaic_not_found(request_id.as_str()).into_response()
        }
    }
}
