//! API models for the Parcel Fertility Analysis server
//!
//! Re-exports domain models from the shared crate and adds the request/report shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use shared::models::*;
use shared::{Coordinate, DateRange, PolygonRings};

/// Pipeline stages of one analysis run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Idle,
    Partitioned,
    IndicesAcquired,
    IndicesSynthesized,
    RecommendationsComputed,
    Categorized,
    Ready,
    Failed,
}

impl AnalysisStage {
    /// The stage that follows this one under `mode`; `None` from a terminal stage
    pub fn next(&self, mode: AnalysisMode) -> Option<AnalysisStage> {
        use AnalysisStage::*;
        match self {
            Idle => Some(Partitioned),
            Partitioned => Some(IndicesAcquired),
            IndicesAcquired => Some(IndicesSynthesized),
            IndicesSynthesized => match mode {
                AnalysisMode::CurrentFertility => Some(Categorized),
                AnalysisMode::Recommendation { .. } => Some(RecommendationsComputed),
            },
            RecommendationsComputed => Some(Categorized),
            Categorized => Some(Ready),
            Ready | Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Ready | AnalysisStage::Failed)
    }
}

/// Body of `POST /api/v1/analyses`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisRequest {
    pub parcel: ParcelInput,
    pub crop: Crop,
    pub mode: AnalysisMode,
    #[serde(default)]
    pub zone_count: Option<u32>,
    pub date_range: DateRange,
    pub source: IndexSourceKind,
    #[serde(default)]
    pub index: VegetationIndex,
}

/// One zone of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub id: u32,
    pub area_ha: f64,
    pub organic_matter: f64,
    pub soil_moisture: f64,
    pub ndvi: f64,
    pub ndre: f64,
    pub npk_current: f64,
    /// Dose in kg/ha, recommendation mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_value: Option<f64>,
    pub category: Category,
    pub category_label: String,
    pub category_label_es: String,
    pub color: String,
    pub centroid: Coordinate,
    pub geometry: Vec<PolygonRings>,
}

impl ZoneReport {
    /// The value the zone was categorized on
    pub fn value(&self) -> f64 {
        self.recommended_value.unwrap_or(self.npk_current)
    }
}

/// Output record of one run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub crop: Crop,
    pub mode: AnalysisMode,
    pub source: IndexSourceRecord,
    /// Non-fatal conditions met during the run, e.g. provider fallback
    pub notices: Vec<String>,
    pub stage: AnalysisStage,
    pub stages: Vec<AnalysisStage>,
    pub zones: Vec<ZoneReport>,
    pub summary: AnalysisSummary,
    pub palette: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fertilizer: Option<String>,
    pub generated_at: DateTime<Utc>,
}
