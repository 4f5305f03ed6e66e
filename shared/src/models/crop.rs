//! Crop profiles: nutrient ranges and agronomic optima per crop

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::analysis::Nutrient;

/// Crops supported by the fertility analysis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Crop {
    Wheat,
    Maize,
    Soybean,
    Sorghum,
    Sunflower,
}

impl Crop {
    pub const ALL: [Crop; 5] = [
        Crop::Wheat,
        Crop::Maize,
        Crop::Soybean,
        Crop::Sorghum,
        Crop::Sunflower,
    ];

    /// Spanish name used by field agronomists and in exported files
    pub fn name_es(&self) -> &'static str {
        match self {
            Crop::Wheat => "TRIGO",
            Crop::Maize => "MAÍZ",
            Crop::Soybean => "SOJA",
            Crop::Sorghum => "SORGO",
            Crop::Sunflower => "GIRASOL",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Crop::Wheat => "wheat",
            Crop::Maize => "maize",
            Crop::Soybean => "soybean",
            Crop::Sorghum => "sorghum",
            Crop::Sunflower => "sunflower",
        }
    }

    /// Profile for this crop from the static crop table
    pub fn profile(&self) -> &'static CropProfile {
        &crop_profiles()[self]
    }
}

impl std::fmt::Display for Crop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crop::Wheat => write!(f, "Wheat"),
            Crop::Maize => write!(f, "Maize"),
            Crop::Soybean => write!(f, "Soybean"),
            Crop::Sorghum => write!(f, "Sorghum"),
            Crop::Sunflower => write!(f, "Sunflower"),
        }
    }
}

/// Unknown crop name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown crop: {0}")]
pub struct UnknownCrop(pub String);

impl FromStr for Crop {
    type Err = UnknownCrop;

    /// Accepts English slugs and the Spanish names (with or without accents)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wheat" | "trigo" => Ok(Crop::Wheat),
            "maize" | "corn" | "maíz" | "maiz" => Ok(Crop::Maize),
            "soybean" | "soy" | "soja" => Ok(Crop::Soybean),
            "sorghum" | "sorgo" => Ok(Crop::Sorghum),
            "sunflower" | "girasol" => Ok(Crop::Sunflower),
            _ => Err(UnknownCrop(s.to_string())),
        }
    }
}

/// Agronomic dose range for one nutrient, in kg/ha
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NutrientRange {
    pub min: f64,
    pub max: f64,
}

impl NutrientRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Imagery acquisition parameters for a crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageryParameters {
    /// Months (1-12) when the canopy signal is most informative
    pub optimal_months: Vec<u32>,
    pub max_cloud_cover_percent: f64,
    /// Nominal resolution in metres
    pub resolution_m: f64,
}

/// Commercial fertilizer suggested for each nutrient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilizerHints {
    pub nitrogen: String,
    pub phosphorus: String,
    pub potassium: String,
}

/// Static agronomic profile of a crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropProfile {
    pub crop: Crop,
    pub nitrogen: NutrientRange,
    pub phosphorus: NutrientRange,
    pub potassium: NutrientRange,
    /// Optimal soil organic matter, %
    pub optimal_organic_matter: f64,
    /// Optimal volumetric soil moisture, fraction
    pub optimal_soil_moisture: f64,
    pub optimal_ndvi: f64,
    pub optimal_ndre: f64,
    pub fertilizers: FertilizerHints,
    pub imagery: ImageryParameters,
}

impl CropProfile {
    pub fn range(&self, nutrient: Nutrient) -> NutrientRange {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
        }
    }

    pub fn fertilizer(&self, nutrient: Nutrient) -> &str {
        match nutrient {
            Nutrient::Nitrogen => &self.fertilizers.nitrogen,
            Nutrient::Phosphorus => &self.fertilizers.phosphorus,
            Nutrient::Potassium => &self.fertilizers.potassium,
        }
    }

    /// Whether any month of the given list falls in the crop's imagery window
    pub fn in_imagery_window(&self, months: &[u32]) -> bool {
        months
            .iter()
            .any(|m| self.imagery.optimal_months.contains(m))
    }
}

fn imagery(months: [u32; 3], max_cloud_cover_percent: f64) -> ImageryParameters {
    ImageryParameters {
        optimal_months: months.to_vec(),
        max_cloud_cover_percent,
        resolution_m: 10.0,
    }
}

fn fertilizers(nitrogen: &str, phosphorus: &str, potassium: &str) -> FertilizerHints {
    FertilizerHints {
        nitrogen: nitrogen.to_string(),
        phosphorus: phosphorus.to_string(),
        potassium: potassium.to_string(),
    }
}

fn build_crop_profiles() -> HashMap<Crop, CropProfile> {
    let profiles = [
        CropProfile {
            crop: Crop::Wheat,
            nitrogen: NutrientRange::new(120.0, 180.0),
            phosphorus: NutrientRange::new(40.0, 60.0),
            potassium: NutrientRange::new(80.0, 120.0),
            optimal_organic_matter: 3.5,
            optimal_soil_moisture: 0.30,
            optimal_ndvi: 0.70,
            optimal_ndre: 0.40,
            fertilizers: fertilizers("Urea (46-0-0)", "Monoammonium phosphate (11-52-0)", "Potassium chloride (0-0-60)"),
            imagery: imagery([5, 6, 7], 10.0),
        },
        CropProfile {
            crop: Crop::Maize,
            nitrogen: NutrientRange::new(150.0, 220.0),
            phosphorus: NutrientRange::new(50.0, 70.0),
            potassium: NutrientRange::new(100.0, 140.0),
            optimal_organic_matter: 4.0,
            optimal_soil_moisture: 0.35,
            optimal_ndvi: 0.75,
            optimal_ndre: 0.45,
            fertilizers: fertilizers("Urea (46-0-0)", "Diammonium phosphate (18-46-0)", "Potassium chloride (0-0-60)"),
            imagery: imagery([6, 7, 8], 10.0),
        },
        CropProfile {
            crop: Crop::Soybean,
            nitrogen: NutrientRange::new(80.0, 120.0),
            phosphorus: NutrientRange::new(40.0, 60.0),
            potassium: NutrientRange::new(120.0, 160.0),
            optimal_organic_matter: 3.8,
            optimal_soil_moisture: 0.40,
            optimal_ndvi: 0.80,
            optimal_ndre: 0.50,
            fertilizers: fertilizers("Ammonium sulfate (21-0-0)", "Triple superphosphate (0-46-0)", "Potassium sulfate (0-0-50)"),
            imagery: imagery([1, 2, 3], 15.0),
        },
        CropProfile {
            crop: Crop::Sorghum,
            nitrogen: NutrientRange::new(100.0, 150.0),
            phosphorus: NutrientRange::new(30.0, 50.0),
            potassium: NutrientRange::new(80.0, 120.0),
            optimal_organic_matter: 3.0,
            optimal_soil_moisture: 0.25,
            optimal_ndvi: 0.65,
            optimal_ndre: 0.35,
            fertilizers: fertilizers("Urea (46-0-0)", "Monoammonium phosphate (11-52-0)", "Potassium chloride (0-0-60)"),
            imagery: imagery([3, 4, 5], 10.0),
        },
        CropProfile {
            crop: Crop::Sunflower,
            nitrogen: NutrientRange::new(90.0, 130.0),
            phosphorus: NutrientRange::new(35.0, 55.0),
            potassium: NutrientRange::new(100.0, 140.0),
            optimal_organic_matter: 3.2,
            optimal_soil_moisture: 0.30,
            optimal_ndvi: 0.70,
            optimal_ndre: 0.40,
            fertilizers: fertilizers("Calcium ammonium nitrate (27-0-0)", "Triple superphosphate (0-46-0)", "Potassium chloride (0-0-60)"),
            imagery: imagery([7, 8, 9], 10.0),
        },
    ];

    profiles.into_iter().map(|p| (p.crop, p)).collect()
}

/// Crop table, built once on first use and never mutated
pub fn crop_profiles() -> &'static HashMap<Crop, CropProfile> {
    static PROFILES: OnceLock<HashMap<Crop, CropProfile>> = OnceLock::new();
    PROFILES.get_or_init(build_crop_profiles)
}
