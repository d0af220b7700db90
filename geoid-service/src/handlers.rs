//! HTTP request handlers for the geoid service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geoid::{GeoidError, Interpolation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the height endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HeightQuery {
    /// Latitude in decimal degrees (-90 to 90).
    pub lat: f64,
    /// Longitude in decimal degrees; any value, wrapped to [0, 360).
    pub lon: f64,
    /// Geoid model, e.g. `egm96-5`. Defaults to the service's model.
    pub model: Option<String>,
    /// `cubic` (default) or `bilinear`.
    pub method: Option<String>,
}

/// Successful height response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeightResponse {
    /// Geoid height above the ellipsoid in meters.
    pub height: f64,
    /// Latitude queried.
    pub lat: f64,
    /// Longitude queried.
    pub lon: f64,
    /// Model used.
    pub model: String,
    /// Interpolation used.
    pub method: String,
}

/// Batch height request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HeightsRequest {
    /// Geoid model. Defaults to the service's model.
    pub model: Option<String>,
    /// `cubic` (default) or `bilinear`.
    pub method: Option<String>,
    /// Points as `[lat, lon]` pairs.
    #[schema(value_type = Vec<Vec<f64>>, example = json!([[16.775833, -3.009444], [51.477928, -0.001545]]))]
    pub points: Vec<[f64; 2]>,
}

/// Batch height response; heights are in the order of the request points.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeightsResponse {
    /// Geoid heights in meters.
    pub heights: Vec<f64>,
    /// Model used.
    pub model: String,
    /// Interpolation used.
    pub method: String,
}

/// Available models.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    /// Model names found in the data directory.
    pub models: Vec<String>,
    /// Model used when a request does not name one.
    pub default_model: String,
}

/// Geometry, calibration and metadata of one model.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelInfoResponse {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Degrees of latitude per row.
    pub lat_res: f64,
    /// Degrees of longitude per column.
    pub lon_res: f64,
    pub offset: f64,
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bilinear_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rms_bilinear_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cubic_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rms_cubic_error: Option<f64>,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of open grids.
    pub cached_models: u64,
    /// Maximum number of open grids.
    pub cache_capacity: u64,
    /// Rows kept in memory per grid.
    pub cache_rows: usize,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Get the geoid height at the given coordinates.
#[utoipa::path(
    get,
    path = "/height",
    tag = "geoid",
    params(HeightQuery),
    responses(
        (status = 200, description = "Geoid height", body = HeightResponse),
        (status = 400, description = "Invalid coordinates, model name or method", body = ErrorResponse),
        (status = 404, description = "Model not found", body = ErrorResponse),
        (status = 500, description = "Grid could not be read", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn get_height(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HeightQuery>,
) -> Response {
    let model = query
        .model
        .unwrap_or_else(|| state.geoid_service.default_model().to_string());

    tracing::debug!(
        lat = query.lat,
        lon = query.lon,
        model = %model,
        method = ?query.method,
        "Height query"
    );

    let method = match parse_method(query.method.as_deref()) {
        Ok(method) => method,
        Err(response) => return response,
    };
    if let Err(message) = validate_point(query.lat, query.lon) {
        return bad_request(message);
    }

    match state
        .geoid_service
        .height(&model, query.lat, query.lon, method)
    {
        Ok(height) => {
            tracing::info!(
                lat = query.lat,
                lon = query.lon,
                model = %model,
                height = height,
                "Height found"
            );
            (
                StatusCode::OK,
                Json(HeightResponse {
                    height,
                    lat: query.lat,
                    lon: query.lon,
                    model,
                    method: method.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(&model, e),
    }
}

/// Get geoid heights for a batch of points.
///
/// All-or-nothing: if any point fails, no heights are returned.
#[utoipa::path(
    post,
    path = "/heights",
    tag = "geoid",
    request_body = HeightsRequest,
    responses(
        (status = 200, description = "Geoid heights in request order", body = HeightsResponse),
        (status = 400, description = "Invalid coordinates, model name or method", body = ErrorResponse),
        (status = 404, description = "Model not found", body = ErrorResponse),
        (status = 500, description = "Grid could not be read", body = ErrorResponse)
    )
)]
pub async fn post_heights(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HeightsRequest>,
) -> Response {
    let model = request
        .model
        .unwrap_or_else(|| state.geoid_service.default_model().to_string());

    let method = match parse_method(request.method.as_deref()) {
        Ok(method) => method,
        Err(response) => return response,
    };

    let mut coords = Vec::with_capacity(request.points.len());
    for (i, [lat, lon]) in request.points.iter().copied().enumerate() {
        if let Err(message) = validate_point(lat, lon) {
            return bad_request(format!("point {}: {}", i, message));
        }
        coords.push((lat, lon));
    }

    tracing::debug!(model = %model, points = coords.len(), "Batch height query");

    match state.geoid_service.heights(&model, &coords, method) {
        Ok(heights) => (
            StatusCode::OK,
            Json(HeightsResponse {
                heights,
                model,
                method: method.to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&model, e),
    }
}

/// List the models available in the data directory.
#[utoipa::path(
    get,
    path = "/models",
    tag = "models",
    responses(
        (status = 200, description = "Available models", body = ModelsResponse)
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.geoid_service.list_models(),
        default_model: state.geoid_service.default_model().to_string(),
    })
}

/// Describe one model.
#[utoipa::path(
    get,
    path = "/models/{name}",
    tag = "models",
    params(("name" = String, Path, description = "Model name, e.g. egm96-5")),
    responses(
        (status = 200, description = "Model information", body = ModelInfoResponse),
        (status = 400, description = "Invalid model name", body = ErrorResponse),
        (status = 404, description = "Model not found", body = ErrorResponse),
        (status = 500, description = "Grid could not be read", body = ErrorResponse)
    )
)]
pub async fn get_model(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let service = &state.geoid_service;
    let result = service
        .info(&name)
        .and_then(|info| service.metadata(&name).map(|metadata| (info, metadata)));

    match result {
        Ok((info, metadata)) => (
            StatusCode::OK,
            Json(ModelInfoResponse {
                name,
                width: info.width,
                height: info.height,
                lat_res: info.lat_res,
                lon_res: info.lon_res,
                offset: info.offset,
                scale: info.scale,
                description: metadata.description,
                url: metadata.url,
                date_time: metadata.date_time,
                max_bilinear_error: metadata.max_bilinear_error,
                rms_bilinear_error: metadata.rms_bilinear_error,
                max_cubic_error: metadata.max_cubic_error,
                rms_cubic_error: metadata.rms_cubic_error,
            }),
        )
            .into_response(),
        Err(e) => error_response(&name, e),
    }
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get cache statistics.
///
/// Returns information about the open-grid cache.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses(
        (status = 200, description = "Cache statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let service = &state.geoid_service;
    let stats = service.cache_stats();

    Json(StatsResponse {
        cached_models: stats.entry_count,
        cache_capacity: service.cache_capacity(),
        cache_rows: service.cache_rows(),
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}

fn parse_method(method: Option<&str>) -> Result<Interpolation, Response> {
    match method {
        None => Ok(Interpolation::default()),
        Some(s) => s.parse().map_err(bad_request),
    }
}

fn validate_point(lat: f64, lon: f64) -> Result<(), String> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(format!("coordinates must be finite: lat={}, lon={}", lat, lon));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {} outside [-90, 90]", lat));
    }
    Ok(())
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
}

/// Create an error response for a failed model query.
fn error_response(model: &str, e: GeoidError) -> Response {
    let status = match &e {
        GeoidError::InvalidCoordinates { .. } | GeoidError::InvalidModelName { .. } => {
            StatusCode::BAD_REQUEST
        }
        GeoidError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!(model = model, error = %e, "Geoid query failed");

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}
