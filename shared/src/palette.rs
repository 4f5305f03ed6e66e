//! Colour ramps for rendering zone categories

use crate::models::{AnalysisMode, Category, Nutrient};

/// Red → green, poor to optimal fertility
const FERTILITY_RAMP: [&str; 5] = ["#d7191c", "#fdae61", "#ffffbf", "#a6d96a", "#1a9641"];
/// Light → dark green, low to high nitrogen dose
const NITROGEN_RAMP: [&str; 5] = ["#edf8e9", "#bae4b3", "#74c476", "#31a354", "#006d2c"];
/// Light → dark purple for phosphorus
const PHOSPHORUS_RAMP: [&str; 5] = ["#f2f0f7", "#cbc9e2", "#9e9ac8", "#756bb1", "#54278f"];
/// Light → dark orange for potassium
const POTASSIUM_RAMP: [&str; 5] = ["#feedde", "#fdbe85", "#fd8d3c", "#e6550d", "#a63603"];

/// Five hex colours, lowest category first, for a mode and nutrient
pub fn color_ramp(mode: AnalysisMode) -> [&'static str; 5] {
    match mode.nutrient() {
        None => FERTILITY_RAMP,
        Some(Nutrient::Nitrogen) => NITROGEN_RAMP,
        Some(Nutrient::Phosphorus) => PHOSPHORUS_RAMP,
        Some(Nutrient::Potassium) => POTASSIUM_RAMP,
    }
}

pub fn category_color(mode: AnalysisMode, category: Category) -> &'static str {
    color_ramp(mode)[category.rank()]
}
