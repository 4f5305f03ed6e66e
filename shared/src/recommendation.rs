//! Fertilizer dose recommendations from zone metrics

use crate::models::{CropProfile, Nutrient, NutrientRange, ZoneMetrics};
use crate::synthesis::ORGANIC_MATTER_REFERENCE;

/// Lowest dose as a share of the crop's range minimum
pub const DOSE_FLOOR_FACTOR: f64 = 0.8;
/// Highest dose as a share of the crop's range maximum
pub const DOSE_CEILING_FACTOR: f64 = 1.2;

/// Deficiency score in [0, 1] for a nutrient; higher means a larger dose
pub fn deficiency_factor(metrics: &ZoneMetrics, nutrient: Nutrient) -> f64 {
    let organic_deficit = 1.0 - metrics.organic_matter / ORGANIC_MATTER_REFERENCE;
    match nutrient {
        Nutrient::Nitrogen => 0.6 * (1.0 - metrics.ndre) + 0.4 * (1.0 - metrics.ndvi),
        Nutrient::Phosphorus => 0.7 * organic_deficit + 0.3 * (1.0 - metrics.soil_moisture),
        Nutrient::Potassium => {
            0.4 * (1.0 - metrics.ndre) + 0.4 * (1.0 - metrics.soil_moisture) + 0.2 * organic_deficit
        }
    }
}

/// Dose in kg/ha for a deficiency factor, clamped to [0.8·min, 1.2·max] and rounded to 0.1
pub fn dose_for_factor(factor: f64, range: NutrientRange) -> f64 {
    let dose = (factor * range.span() + range.min)
        .clamp(range.min * DOSE_FLOOR_FACTOR, range.max * DOSE_CEILING_FACTOR);
    (dose * 10.0).round() / 10.0
}

/// Recommended dose of one nutrient for a zone
pub fn recommend_zone(metrics: &ZoneMetrics, nutrient: Nutrient, crop: &CropProfile) -> f64 {
    dose_for_factor(deficiency_factor(metrics, nutrient), crop.range(nutrient))
}

/// One dose per zone, in zone order
pub fn recommend(metrics: &[ZoneMetrics], nutrient: Nutrient, crop: &CropProfile) -> Vec<f64> {
    metrics
        .iter()
        .map(|m| recommend_zone(m, nutrient, crop))
        .collect()
}
