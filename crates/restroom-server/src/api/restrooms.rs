use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use restroom_core::{display_meters, GeoPoint};
use restroom_nearby::{NearbyError, NearbyResults};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_RADIUS_METERS: f64 = 5_000.0;

#[derive(Debug, Deserialize)]
pub(super) struct NearbyQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearbyData {
    pub points: Vec<GeoPoint>,
    pub warnings: Vec<String>,
    pub cached: bool,
}

impl From<NearbyResults> for NearbyData {
    fn from(results: NearbyResults) -> Self {
        let points = results
            .points
            .into_iter()
            .map(|mut point| {
                point.distance_meters = display_meters(point.distance_meters);
                point
            })
            .collect();
        Self {
            points,
            warnings: results.warnings,
            cached: results.cached,
        }
    }
}

pub(super) async fn find_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<NearbyData>>, ApiError> {
    let Query(query) = query.map_err(|e| {
        ApiError::new(req_id.0.clone(), "validation_error", e.body_text())
    })?;

    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "lat and lon query parameters are required",
        ));
    };
    let radius = query.radius.unwrap_or(DEFAULT_RADIUS_METERS);

    let results = state
        .aggregator
        .find_nearby_aggregated(lat, lon, radius)
        .await
        .map_err(|e| map_nearby_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: NearbyData::from(results),
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_nearby_error(request_id: String, error: &NearbyError) -> ApiError {
    if error.is_validation() {
        return ApiError::new(request_id, "validation_error", error.to_string());
    }
    match error {
        NearbyError::StoreQueryFailed(_) => {
            tracing::error!(error = %error, "nearby query failed");
            ApiError::new(
                request_id,
                "store_unavailable",
                "restroom data is temporarily unavailable; try again shortly",
            )
        }
        _ => {
            tracing::error!(error = %error, "unexpected nearby error");
            ApiError::new(request_id, "internal_error", "nearby query failed")
        }
    }
}
