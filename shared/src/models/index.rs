//! Vegetation indices and the record an index source produces

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spectral indices the providers can compute
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum VegetationIndex {
    #[default]
    Ndvi,
    Ndre,
    Gndvi,
    Osavi,
    Mcari,
}

/// Surface reflectance of one pixel, Sentinel-2 band naming
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Reflectance {
    /// Green
    pub b03: f64,
    /// Red
    pub b04: f64,
    /// Red edge
    pub b05: f64,
    /// Near infrared
    pub b08: f64,
}

impl VegetationIndex {
    pub const ALL: [VegetationIndex; 5] = [
        VegetationIndex::Ndvi,
        VegetationIndex::Ndre,
        VegetationIndex::Gndvi,
        VegetationIndex::Osavi,
        VegetationIndex::Mcari,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VegetationIndex::Ndvi => "ndvi",
            VegetationIndex::Ndre => "ndre",
            VegetationIndex::Gndvi => "gndvi",
            VegetationIndex::Osavi => "osavi",
            VegetationIndex::Mcari => "mcari",
        }
    }

    /// Whether the index needs the red-edge band
    pub fn needs_red_edge(&self) -> bool {
        matches!(self, VegetationIndex::Ndre | VegetationIndex::Mcari)
    }

    /// Index value for one pixel; `None` where the denominator vanishes
    pub fn compute(&self, r: &Reflectance) -> Option<f64> {
        let ratio = |num: f64, den: f64| (den.abs() > f64::EPSILON).then(|| num / den);
        match self {
            VegetationIndex::Ndvi => ratio(r.b08 - r.b04, r.b08 + r.b04),
            VegetationIndex::Ndre => ratio(r.b08 - r.b05, r.b08 + r.b05),
            VegetationIndex::Gndvi => ratio(r.b08 - r.b03, r.b08 + r.b03),
            VegetationIndex::Osavi => ratio(r.b08 - r.b04, r.b08 + r.b04 + 0.16),
            VegetationIndex::Mcari => ratio(r.b05, r.b04)
                .map(|edge_ratio| ((r.b05 - r.b04) - 0.2 * (r.b05 - r.b03)) * edge_ratio),
        }
    }

    /// Evalscript expression over `sample.<band>` for the given band names
    pub fn expression(&self, bands: &BandNames) -> Option<String> {
        let nir = bands.nir;
        let red = bands.red;
        let green = bands.green;
        let expr = match (self, bands.red_edge) {
            (VegetationIndex::Ndvi, _) => format!(
                "(sample.{nir} - sample.{red}) / (sample.{nir} + sample.{red})"
            ),
            (VegetationIndex::Gndvi, _) => format!(
                "(sample.{nir} - sample.{green}) / (sample.{nir} + sample.{green})"
            ),
            (VegetationIndex::Osavi, _) => format!(
                "(sample.{nir} - sample.{red}) / (sample.{nir} + sample.{red} + 0.16)"
            ),
            (VegetationIndex::Ndre, Some(edge)) => format!(
                "(sample.{nir} - sample.{edge}) / (sample.{nir} + sample.{edge})"
            ),
            (VegetationIndex::Mcari, Some(edge)) => format!(
                "((sample.{edge} - sample.{red}) - 0.2 * (sample.{edge} - sample.{green})) * (sample.{edge} / sample.{red})"
            ),
            (VegetationIndex::Ndre | VegetationIndex::Mcari, None) => return None,
        };
        Some(expr)
    }
}

impl std::fmt::Display for VegetationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_uppercase())
    }
}

/// Band identifiers of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandNames {
    pub green: &'static str,
    pub red: &'static str,
    pub red_edge: Option<&'static str>,
    pub nir: &'static str,
}

impl BandNames {
    pub fn all(&self) -> Vec<&'static str> {
        let mut bands = vec![self.green, self.red];
        bands.extend(self.red_edge);
        bands.push(self.nir);
        bands
    }
}

/// Where an index record came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndexSourceKind {
    Sentinel2,
    Landsat,
    Simulated,
}

impl IndexSourceKind {
    pub fn slug(&self) -> &'static str {
        match self {
            IndexSourceKind::Sentinel2 => "sentinel2",
            IndexSourceKind::Landsat => "landsat",
            IndexSourceKind::Simulated => "simulated",
        }
    }
}

impl std::fmt::Display for IndexSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexSourceKind::Sentinel2 => write!(f, "Sentinel-2"),
            IndexSourceKind::Landsat => write!(f, "Landsat 8/9"),
            IndexSourceKind::Simulated => write!(f, "Simulated"),
        }
    }
}

/// Aggregate of raster pixels falling inside a polygon
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ZonalStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub pixel_count: usize,
}

/// Scalar summary of one index acquisition, shared read-only by every zone of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSourceRecord {
    pub index: VegetationIndex,
    /// Parcel-wide mean of the index, typically in [0, 1]
    pub base_value: f64,
    pub source: IndexSourceKind,
    pub source_label: String,
    pub acquisition_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover_percent: Option<f64>,
    pub resolution_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ZonalStatistics>,
}
