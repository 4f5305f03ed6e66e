//! WebAssembly module for the parcel fertility dashboard
//!
//! Provides client-side computation for:
//! - Parcel area and zone previews before a run is submitted
//! - Fertility and dose categorization
//! - Per-zone dose recommendations
//! - Legend colour ramps

use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

#[derive(Serialize)]
struct ZonePreview {
    id: u32,
    area_ha: f64,
    centroid: Coordinate,
    geometry: Vec<PolygonRings>,
}

fn parse_crop(crop: &str) -> Result<Crop, String> {
    crop.parse::<Crop>().map_err(|e| e.to_string())
}

fn parse_nutrient(nutrient: &str) -> Result<Nutrient, String> {
    match nutrient.trim().to_lowercase().as_str() {
        "n" | "nitrogen" | "nitrógeno" | "nitrogeno" => Ok(Nutrient::Nitrogen),
        "p" | "phosphorus" | "fósforo" | "fosforo" => Ok(Nutrient::Phosphorus),
        "k" | "potassium" | "potasio" => Ok(Nutrient::Potassium),
        other => Err(format!("unknown nutrient: {}", other)),
    }
}

fn parse_parcel(parcel_json: &str) -> Result<Parcel, String> {
    let input: ParcelInput =
        serde_json::from_str(parcel_json).map_err(|e| format!("Invalid parcel JSON: {}", e))?;
    Ok(Parcel::from(&input))
}

fn recommendation_category(value: f64, crop: &str, nutrient: &str) -> Result<(Category, AnalysisMode), String> {
    let crop = parse_crop(crop)?;
    let mode = AnalysisMode::Recommendation {
        nutrient: parse_nutrient(nutrient)?,
    };
    Ok((shared::categorize(value, mode, crop.profile()), mode))
}

fn dose(metrics_json: &str, crop: &str, nutrient: &str) -> Result<f64, String> {
    let metrics: ZoneMetrics =
        serde_json::from_str(metrics_json).map_err(|e| format!("Invalid metrics JSON: {}", e))?;
    let crop = parse_crop(crop)?;
    Ok(shared::recommend_zone(&metrics, parse_nutrient(nutrient)?, crop.profile()))
}

fn zone_previews(parcel_json: &str, zone_count: u32) -> Result<String, String> {
    shared::validate_zone_count(zone_count, shared::MIN_ZONE_COUNT, shared::MAX_ZONE_COUNT)
        .map_err(|e| e.to_string())?;
    let parcel = parse_parcel(parcel_json)?;
    let zones: Vec<ZonePreview> = shared::partition(&parcel, zone_count)
        .iter()
        .map(|zone| ZonePreview {
            id: zone.id,
            area_ha: zone.area_ha,
            centroid: zone.centroid,
            geometry: zone.rings(),
        })
        .collect();
    serde_json::to_string(&zones).map_err(|e| e.to_string())
}

fn index_value(index: &str, b03: f64, b04: f64, b05: f64, b08: f64) -> Result<Option<f64>, String> {
    let index: VegetationIndex = serde_json::from_value(serde_json::Value::String(index.to_lowercase()))
        .map_err(|_| format!("unknown index: {}", index))?;
    Ok(index.compute(&Reflectance { b03, b04, b05, b08 }))
}

fn ramp(mode_json: &str) -> Result<String, String> {
    let mode: AnalysisMode =
        serde_json::from_str(mode_json).map_err(|e| format!("Invalid mode JSON: {}", e))?;
    serde_json::to_string(&shared::color_ramp(mode)).map_err(|e| e.to_string())
}

/// Label of a composite NPK index in "current fertility" mode
#[wasm_bindgen]
pub fn categorize_fertility(value: f64) -> String {
    shared::categorize_fertility(value)
        .label(AnalysisMode::CurrentFertility)
        .to_string()
}

/// Label of a dose against the crop's range for a nutrient
#[wasm_bindgen]
pub fn categorize_recommendation(value: f64, crop: &str, nutrient: &str) -> Result<String, JsValue> {
    let (category, mode) =
        recommendation_category(value, crop, nutrient).map_err(|e| JsValue::from_str(&e))?;
    Ok(category.label(mode).to_string())
}

/// Dose in kg/ha for one zone's metrics
#[wasm_bindgen]
pub fn recommend_dose(metrics_json: &str, crop: &str, nutrient: &str) -> Result<f64, JsValue> {
    dose(metrics_json, crop, nutrient).map_err(|e| JsValue::from_str(&e))
}

/// Area of each parcel polygon in hectares
#[wasm_bindgen]
pub fn parcel_area_hectares(parcel_json: &str) -> Result<Vec<f64>, JsValue> {
    let parcel = parse_parcel(parcel_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(shared::area_hectares(&parcel))
}

/// Zone preview as JSON: `[{ id, area_ha, centroid, geometry }]`
#[wasm_bindgen]
pub fn partition_parcel(parcel_json: &str, zone_count: u32) -> Result<String, JsValue> {
    zone_previews(parcel_json, zone_count).map_err(|e| JsValue::from_str(&e))
}

/// Index value of one pixel from Sentinel-2 reflectances; `undefined` where the ratio is undefined
#[wasm_bindgen]
pub fn vegetation_index(index: &str, b03: f64, b04: f64, b05: f64, b08: f64) -> Result<Option<f64>, JsValue> {
    index_value(index, b03, b04, b05, b08).map_err(|e| JsValue::from_str(&e))
}

/// Legend colours for a mode, lowest category first, as a JSON array
#[wasm_bindgen]
pub fn color_ramp(mode_json: &str) -> Result<String, JsValue> {
    ramp(mode_json).map_err(|e| JsValue::from_str(&e))
}
