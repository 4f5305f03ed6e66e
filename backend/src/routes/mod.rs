//! Route definitions for the Parcel Fertility Analysis server

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/sources", get(handlers::list_sources))
        .nest("/crops", crop_routes())
        .nest("/analyses", analysis_routes())
}

/// Crop profile routes
fn crop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_crops))
        .route("/:crop", get(handlers::get_crop))
}

/// Analysis routes
fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::run_analysis))
        .route("/export", post(handlers::export_analysis))
}
