//! Analysis modes, nutrients, categories and run-level aggregates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Primary macronutrients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium];

    pub fn symbol(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "N",
            Nutrient::Phosphorus => "P",
            Nutrient::Potassium => "K",
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nutrient::Nitrogen => write!(f, "Nitrogen"),
            Nutrient::Phosphorus => write!(f, "Phosphorus"),
            Nutrient::Potassium => write!(f, "Potassium"),
        }
    }
}

/// What a run estimates for each zone
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Composite NPK fertility index per zone
    CurrentFertility,
    /// Fertilizer dose of one nutrient per zone, kg/ha
    Recommendation { nutrient: Nutrient },
}

impl AnalysisMode {
    pub fn nutrient(&self) -> Option<Nutrient> {
        match self {
            AnalysisMode::CurrentFertility => None,
            AnalysisMode::Recommendation { nutrient } => Some(*nutrient),
        }
    }

    pub fn slug(&self) -> String {
        match self {
            AnalysisMode::CurrentFertility => "current_fertility".to_string(),
            AnalysisMode::Recommendation { nutrient } => {
                format!("recommendation_{}", nutrient.symbol().to_lowercase())
            }
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::CurrentFertility => write!(f, "Current fertility"),
            AnalysisMode::Recommendation { nutrient } => {
                write!(f, "{} recommendation", nutrient)
            }
        }
    }
}

/// Five ordinal bands a zone value falls into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::VeryLow,
        Category::Low,
        Category::Medium,
        Category::High,
        Category::VeryHigh,
    ];

    /// Position 0..=4, lowest first
    pub fn rank(&self) -> usize {
        match self {
            Category::VeryLow => 0,
            Category::Low => 1,
            Category::Medium => 2,
            Category::High => 3,
            Category::VeryHigh => 4,
        }
    }

    pub fn label(&self, mode: AnalysisMode) -> &'static str {
        match (mode, self) {
            (AnalysisMode::CurrentFertility, Category::VeryLow) => "Very Poor",
            (AnalysisMode::CurrentFertility, Category::Low) => "Poor",
            (AnalysisMode::CurrentFertility, Category::Medium) => "Moderate",
            (AnalysisMode::CurrentFertility, Category::High) => "Good",
            (AnalysisMode::CurrentFertility, Category::VeryHigh) => "Optimal",
            (AnalysisMode::Recommendation { .. }, Category::VeryLow) => "Very Low",
            (AnalysisMode::Recommendation { .. }, Category::Low) => "Low",
            (AnalysisMode::Recommendation { .. }, Category::Medium) => "Medium",
            (AnalysisMode::Recommendation { .. }, Category::High) => "High",
            (AnalysisMode::Recommendation { .. }, Category::VeryHigh) => "Very High",
        }
    }

    pub fn label_es(&self, mode: AnalysisMode) -> &'static str {
        match (mode, self) {
            (AnalysisMode::CurrentFertility, Category::VeryLow) => "MUY POBRE",
            (AnalysisMode::CurrentFertility, Category::Low) => "POBRE",
            (AnalysisMode::CurrentFertility, Category::Medium) => "MODERADA",
            (AnalysisMode::CurrentFertility, Category::High) => "BUENA",
            (AnalysisMode::CurrentFertility, Category::VeryHigh) => "ÓPTIMA",
            (AnalysisMode::Recommendation { .. }, Category::VeryLow) => "MUY BAJO",
            (AnalysisMode::Recommendation { .. }, Category::Low) => "BAJO",
            (AnalysisMode::Recommendation { .. }, Category::Medium) => "MEDIO",
            (AnalysisMode::Recommendation { .. }, Category::High) => "ALTO",
            (AnalysisMode::Recommendation { .. }, Category::VeryHigh) => "MUY ALTO",
        }
    }
}

/// Run-level aggregates over the zone values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisSummary {
    pub zone_count: usize,
    pub total_area_ha: f64,
    /// Mean of the mode's value (NPK index or dose); 0 with no zones
    pub mean_value: f64,
    /// Population standard deviation; 0 with no zones
    pub std_dev: f64,
    /// std_dev / mean × 100; 0 when the mean is 0
    pub coefficient_of_variation: f64,
    pub category_counts: BTreeMap<Category, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_shape() {
        let mode = AnalysisMode::Recommendation {
            nutrient: Nutrient::Potassium,
        };
        let json = serde_json::to_value(mode).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "recommendation", "nutrient": "potassium" })
        );

        let parsed: AnalysisMode =
            serde_json::from_value(serde_json::json!({ "type": "current_fertility" })).unwrap();
        assert_eq!(parsed, AnalysisMode::CurrentFertility);
    }

    #[test]
    fn test_category_ordering() {
        assert!(Category::VeryLow < Category::Low);
        assert!(Category::High < Category::VeryHigh);
        assert_eq!(Category::VeryHigh.rank(), 4);
    }

    #[test]
    fn test_labels_depend_on_mode() {
        let fertility = AnalysisMode::CurrentFertility;
        let dose = AnalysisMode::Recommendation {
            nutrient: Nutrient::Nitrogen,
        };
        assert_eq!(Category::VeryHigh.label(fertility), "Optimal");
        assert_eq!(Category::VeryHigh.label(dose), "Very High");
        assert_eq!(Category::VeryLow.label_es(fertility), "MUY POBRE");
    }

    #[test]
    fn test_mode_slug() {
        assert_eq!(AnalysisMode::CurrentFertility.slug(), "current_fertility");
        assert_eq!(
            AnalysisMode::Recommendation {
                nutrient: Nutrient::Phosphorus
            }
            .slug(),
            "recommendation_p"
        );
    }
}
