//! Geoid Service - HTTP microservice for geoid height queries.
//!
//! A REST API for converting between ellipsoidal and orthometric heights
//! using EGM geoid grids.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GEOID_DATA_DIR` | Directory containing .pgm grids | Current directory |
//! | `GEOID_CACHE_SIZE` | Maximum open grids | 4 |
//! | `GEOID_CACHE_ROWS` | Rows kept in memory per grid | 16 |
//! | `GEOID_DEFAULT_MODEL` | Model used when a request names none | egm96-5 |
//! | `GEOID_PORT` | HTTP server port | 8080 |
//! | `GEOID_PRELOAD` | `all`, or comma-separated model names | None |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /height?lat=X&lon=Y[&model=M][&method=cubic|bilinear]` - Geoid height
//! - `POST /heights` - Batch geoid heights
//! - `GET /models` - Available models
//! - `GET /models/{name}` - Model geometry and metadata
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use geoid::GeoidServiceBuilder;
use geoid_service::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoid_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("GEOID_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // The library reads GEOID_DATA_DIR, GEOID_CACHE_SIZE, GEOID_CACHE_ROWS
    // and GEOID_DEFAULT_MODEL
    let geoid_service = match GeoidServiceBuilder::from_env() {
        Ok(builder) => builder.build(),
        Err(_) => {
            tracing::warn!("GEOID_DATA_DIR not set, using current directory");
            GeoidServiceBuilder::new(".").build()
        }
    };

    tracing::info!(
        data_dir = %geoid_service.data_dir().display(),
        cache_capacity = geoid_service.cache_capacity(),
        cache_rows = geoid_service.cache_rows(),
        default_model = geoid_service.default_model(),
        port = port,
        "Starting geoid service"
    );

    if let Ok(preload_val) = std::env::var("GEOID_PRELOAD") {
        let models = parse_preload_models(&preload_val);
        tracing::info!(models = ?models, "Preloading geoid models");
        let stats = geoid_service.preload(models.as_deref());
        tracing::info!(
            models_loaded = stats.models_loaded,
            models_already_cached = stats.models_already_cached,
            models_failed = stats.models_failed,
            elapsed_ms = stats.elapsed_ms,
            "Preload complete"
        );
    }

    let state = Arc::new(AppState { geoid_service });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse the `GEOID_PRELOAD` environment variable value.
///
/// Supported formats:
/// - `true`, `all`, `1` - preload every model in the data directory (returns `None`)
/// - `egm96-5,egm2008-1` - preload the named models
fn parse_preload_models(value: &str) -> Option<Vec<String>> {
    let trimmed = value.trim();

    match trimmed.to_lowercase().as_str() {
        "true" | "all" | "1" => return None,
        _ => {}
    }

    let models: Vec<String> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    if models.is_empty() {
        tracing::warn!(
            value = trimmed,
            "Could not parse GEOID_PRELOAD value, preloading all models"
        );
        None
    } else {
        Some(models)
    }
}
