//! HTTP handlers for analysis runs

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::AppResult;
use crate::models::{AnalysisReport, AnalysisRequest};
use crate::services::export::{export_filename, export_to_csv};
use crate::AppState;

/// Run one analysis and return the report
pub async fn run_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> AppResult<Json<AnalysisReport>> {
    let report = state.analysis.run(request).await?;
    Ok(Json(report))
}

/// Run one analysis and return its zones as a CSV download
pub async fn export_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> AppResult<Response> {
    let report = state.analysis.run(request).await?;
    let csv = export_to_csv(&report)?;
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&report));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
