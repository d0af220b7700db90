//! Geoid Service Library
//!
//! HTTP handlers, OpenAPI document and router for the geoid height service.
//! This library is used by both the geoid-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use geoid::GeoidService;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Geoid service for height queries.
    pub geoid_service: GeoidService,
}

/// OpenAPI documentation for the geoid service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geoid Height Service",
        version = "0.1.0",
        description = "REST API for geoid undulation lookups over EGM grids.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "Pedro Sanz Martinez", url = "https://github.com/pedrosanzmtz/geoid")
    ),
    paths(
        handlers::get_height,
        handlers::post_heights,
        handlers::list_models,
        handlers::get_model,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::HeightResponse,
            handlers::HeightsRequest,
            handlers::HeightsResponse,
            handlers::ModelsResponse,
            handlers::ModelInfoResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "geoid", description = "Geoid height endpoints"),
        (name = "models", description = "Model discovery endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with docs, tracing and CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/height", get(handlers::get_height))
        .route("/heights", post(handlers::post_heights))
        .route("/models", get(handlers::list_models))
        .route("/models/:name", get(handlers::get_model))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, HealthResponse, HeightQuery, HeightResponse, HeightsRequest, HeightsResponse,
    ModelInfoResponse, ModelsResponse, StatsResponse,
};
