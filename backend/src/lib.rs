//! Parcel Fertility Analysis - backend library
//!
//! Splits a farm parcel into management zones, derives soil and canopy metrics per zone from
//! satellite or simulated vegetation indices, and recommends NPK doses.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;

use error::{AppError, AppResult};
use external::SentinelHubClient;
use services::AnalysisService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: AnalysisService,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let limits = &config.analysis;
        if limits.min_zone_count == 0
            || limits.default_zone_count < limits.min_zone_count
            || limits.default_zone_count > limits.max_zone_count
        {
            return Err(AppError::Configuration(format!(
                "zone count limits must satisfy 0 < min <= default <= max (got {} / {} / {})",
                limits.min_zone_count, limits.default_zone_count, limits.max_zone_count
            )));
        }

        let config = Arc::new(config);
        let client = SentinelHubClient::new(
            &config.sentinel_hub,
            Duration::from_secs(config.analysis.provider_timeout_secs),
        )
        .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            analysis: AnalysisService::new(Arc::clone(&config), client),
            config,
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Parcel Fertility Analysis API v1.0"
}
