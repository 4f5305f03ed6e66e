//! Tabular export of finished analyses

use serde::Serialize;
use shared::Category;

use crate::error::{AppError, AppResult};
use crate::models::AnalysisReport;

/// Column names, in `ExportRow` field order
const EXPORT_HEADER: [&str; 18] = [
    "zone_id",
    "area_ha",
    "organic_matter",
    "soil_moisture",
    "ndvi",
    "ndre",
    "npk_current",
    "recommended_value",
    "category",
    "category_label",
    "category_label_es",
    "fertilizer",
    "crop",
    "crop_es",
    "centroid_x",
    "centroid_y",
    "source",
    "acquisition_date",
];

/// One CSV row per zone
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    zone_id: u32,
    area_ha: f64,
    organic_matter: f64,
    soil_moisture: f64,
    ndvi: f64,
    ndre: f64,
    npk_current: f64,
    recommended_value: Option<f64>,
    category: Category,
    category_label: &'a str,
    category_label_es: &'a str,
    fertilizer: Option<&'a str>,
    crop: &'a str,
    crop_es: &'a str,
    centroid_x: f64,
    centroid_y: f64,
    source: &'a str,
    acquisition_date: String,
}

/// Suggested download name: `fertility_{crop}_{source}_{mode}_{YYYYmmdd_HHMMSS}.csv`
pub fn export_filename(report: &AnalysisReport) -> String {
    format!(
        "fertility_{}_{}_{}_{}.csv",
        report.crop.slug(),
        report.source.source.slug(),
        report.mode.slug(),
        report.generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// Export report zones as CSV; a run without zones still gets the header row
pub fn export_to_csv(report: &AnalysisReport) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let acquisition_date = report.source.acquisition_date.to_string();
    if report.zones.is_empty() {
        wtr.write_record(EXPORT_HEADER)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    for zone in &report.zones {
        wtr.serialize(ExportRow {
            zone_id: zone.id,
            area_ha: zone.area_ha,
            organic_matter: zone.organic_matter,
            soil_moisture: zone.soil_moisture,
            ndvi: zone.ndvi,
            ndre: zone.ndre,
            npk_current: zone.npk_current,
            recommended_value: zone.recommended_value,
            category: zone.category,
            category_label: &zone.category_label,
            category_label_es: &zone.category_label_es,
            fertilizer: report.fertilizer.as_deref(),
            crop: report.crop.slug(),
            crop_es: report.crop.name_es(),
            centroid_x: zone.centroid.x,
            centroid_y: zone.centroid.y,
            source: &report.source.source_label,
            acquisition_date: acquisition_date.clone(),
        })
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
