//! Index source credential status

use axum::{extract::State, Json};
use serde::Serialize;
use shared::IndexSourceKind;

use crate::external::Collection;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SourceStatus {
    pub source: IndexSourceKind,
    pub label: String,
    /// False when requests for this source will run on simulated data
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_m: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    /// Leading characters of the configured instance id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub sources: Vec<SourceStatus>,
}

/// Which index sources can be queried with the current credentials
pub async fn list_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    let sentinel_hub = &state.config.sentinel_hub;
    let configured = sentinel_hub.credentials().is_some();

    let mut sources: Vec<SourceStatus> = [Collection::Sentinel2L2a, Collection::LandsatOtL2]
        .into_iter()
        .map(|collection| SourceStatus {
            source: collection.source_kind(),
            label: collection.label().to_string(),
            configured,
            collection: Some(collection.id()),
            resolution_m: Some(collection.resolution_m()),
        })
        .collect();
    sources.push(SourceStatus {
        source: IndexSourceKind::Simulated,
        label: "Simulated data".to_string(),
        configured: true,
        collection: None,
        resolution_m: None,
    });

    Json(SourcesResponse {
        instance_id: sentinel_hub.instance_id_hint(),
        sources,
    })
}
