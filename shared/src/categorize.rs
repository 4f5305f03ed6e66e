//! Five-band categorization of zone values

use crate::models::{AnalysisMode, Category, CropProfile, NutrientRange};

/// Upper (exclusive) bounds of the four lower fertility bands on the [0, 1] NPK index
pub const FERTILITY_THRESHOLDS: [f64; 4] = [0.3, 0.5, 0.6, 0.7];

fn band(value: f64, thresholds: [f64; 4]) -> Category {
    if value < thresholds[0] {
        Category::VeryLow
    } else if value < thresholds[1] {
        Category::Low
    } else if value < thresholds[2] {
        Category::Medium
    } else if value < thresholds[3] {
        Category::High
    } else {
        Category::VeryHigh
    }
}

/// Band of a composite NPK index
pub fn categorize_fertility(value: f64) -> Category {
    band(value, FERTILITY_THRESHOLDS)
}

/// Band of a dose within the crop's range split into five equal widths.
/// Doses outside the range land in the extreme bands.
pub fn categorize_dose(value: f64, range: NutrientRange) -> Category {
    let step = range.span() / 5.0;
    band(
        value,
        [
            range.min + step,
            range.min + 2.0 * step,
            range.min + 3.0 * step,
            range.min + 4.0 * step,
        ],
    )
}

/// Category of a zone value under the given mode
pub fn categorize(value: f64, mode: AnalysisMode, crop: &CropProfile) -> Category {
    match mode {
        AnalysisMode::CurrentFertility => categorize_fertility(value),
        AnalysisMode::Recommendation { nutrient } => categorize_dose(value, crop.range(nutrient)),
    }
}
