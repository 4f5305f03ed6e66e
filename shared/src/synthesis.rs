//! Zonal index synthesis: per-zone soil and canopy metrics from a base index and zone position

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::models::{
    CropProfile, IndexSourceKind, IndexSourceRecord, ManagementZone, Parcel, VegetationIndex,
    ZoneMetrics,
};
use crate::types::{Coordinate, DateRange};
use crate::zonal::IndexRaster;

/// Source of zero-mean Gaussian noise
pub trait NoiseSource {
    fn gaussian(&mut self, std_dev: f64) -> f64;
}

/// Gaussian noise drawn from any `rand` generator
#[derive(Debug, Clone)]
pub struct GaussianNoise<R> {
    rng: R,
}

impl<R: Rng> GaussianNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> NoiseSource for GaussianNoise<R> {
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        match Normal::new(0.0, std_dev) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }
}

/// Noise source that always returns zero, for exact expectations
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn gaussian(&mut self, _std_dev: f64) -> f64 {
        0.0
    }
}

/// Weights, noise and valid range of one synthesized metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricModel {
    pub base_weight: f64,
    pub variability_weight: f64,
    pub noise_std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricModel {
    /// `driver × base_weight + pattern × optimum × variability_weight + noise`, clamped
    pub fn value(&self, driver: f64, optimum: f64, pattern: f64, noise: &mut impl NoiseSource) -> f64 {
        let base = driver * self.base_weight;
        let variability = pattern * optimum * self.variability_weight;
        (base + variability + noise.gaussian(self.noise_std_dev)).clamp(self.min, self.max)
    }
}

pub const ORGANIC_MATTER: MetricModel = MetricModel {
    base_weight: 0.7,
    variability_weight: 0.6,
    noise_std_dev: 0.3,
    min: 0.5,
    max: 8.0,
};

pub const SOIL_MOISTURE: MetricModel = MetricModel {
    base_weight: 0.8,
    variability_weight: 0.4,
    noise_std_dev: 0.05,
    min: 0.1,
    max: 0.8,
};

pub const NDVI: MetricModel = MetricModel {
    base_weight: 0.8,
    variability_weight: 0.3,
    noise_std_dev: 0.04,
    min: 0.1,
    max: 0.9,
};

pub const NDRE: MetricModel = MetricModel {
    base_weight: 0.8,
    variability_weight: 0.3,
    noise_std_dev: 0.03,
    min: 0.05,
    max: 0.7,
};

/// Organic matter % at which the composite treats the soil as saturated
pub const ORGANIC_MATTER_REFERENCE: f64 = 8.0;

/// Weight of the spatial pattern along x; y gets the remainder
pub const PATTERN_X_WEIGHT: f64 = 0.6;

/// Scale applied to the crop's optimal NDVI by the simulated source
pub const SIMULATED_NDVI_FACTOR: f64 = 0.9;
pub const SIMULATED_SCENE_JITTER: f64 = 0.03;
pub const SIMULATED_PIXEL_JITTER: f64 = 0.02;
/// Upper bound on simulated raster width/height in pixels
pub const SIMULATED_MAX_PIXELS_PER_SIDE: usize = 128;

/// `0.4·ndvi + 0.3·ndre + 0.2·(om/8) + 0.1·moisture`, clamped to [0, 1]
pub fn npk_composite(organic_matter: f64, soil_moisture: f64, ndvi: f64, ndre: f64) -> f64 {
    (0.4 * ndvi
        + 0.3 * ndre
        + 0.2 * (organic_matter / ORGANIC_MATTER_REFERENCE)
        + 0.1 * soil_moisture)
        .clamp(0.0, 1.0)
}

/// NDVI- and NDRE-equivalent drivers read from the source's base value
pub fn index_drivers(record: &IndexSourceRecord, crop: &CropProfile) -> (f64, f64) {
    let base = record.base_value;
    match record.index {
        VegetationIndex::Ndre => (base * crop.optimal_ndvi / crop.optimal_ndre, base),
        _ => (base, base * crop.optimal_ndre / crop.optimal_ndvi),
    }
}

/// Metrics of one zone given its spatial pattern value in [0, 1]
pub fn zone_metrics(
    pattern: f64,
    crop: &CropProfile,
    drivers: (f64, f64),
    noise: &mut impl NoiseSource,
) -> ZoneMetrics {
    let (ndvi_driver, ndre_driver) = drivers;
    let organic_matter = ORGANIC_MATTER.value(
        crop.optimal_organic_matter,
        crop.optimal_organic_matter,
        pattern,
        noise,
    );
    let soil_moisture = SOIL_MOISTURE.value(
        crop.optimal_soil_moisture,
        crop.optimal_soil_moisture,
        pattern,
        noise,
    );
    let ndvi = NDVI.value(ndvi_driver, crop.optimal_ndvi, pattern, noise);
    let ndre = NDRE.value(ndre_driver, crop.optimal_ndre, pattern, noise);

    ZoneMetrics {
        organic_matter,
        soil_moisture,
        ndvi,
        ndre,
        npk_current: npk_composite(organic_matter, soil_moisture, ndvi, ndre),
    }
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        (value - min) / (max - min)
    } else {
        0.5
    }
}

/// Spatial pattern per centroid: `0.6·x_norm + 0.4·y_norm`, each axis min-max normalized over the batch
pub fn spatial_patterns(centroids: &[Coordinate]) -> Vec<f64> {
    let (min_x, max_x, min_y, max_y) = centroids.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), c| {
            (min_x.min(c.x), max_x.max(c.x), min_y.min(c.y), max_y.max(c.y))
        },
    );

    centroids
        .iter()
        .map(|c| {
            let x = normalize(c.x, min_x, max_x);
            let y = normalize(c.y, min_y, max_y);
            PATTERN_X_WEIGHT * x + (1.0 - PATTERN_X_WEIGHT) * y
        })
        .collect()
}

/// One `ZoneMetrics` per zone, in zone order
pub fn synthesize(
    zones: &[ManagementZone],
    crop: &CropProfile,
    record: &IndexSourceRecord,
    noise: &mut impl NoiseSource,
) -> Vec<ZoneMetrics> {
    let centroids: Vec<Coordinate> = zones.iter().map(|z| z.centroid).collect();
    let drivers = index_drivers(record, crop);
    spatial_patterns(&centroids)
        .into_iter()
        .map(|pattern| zone_metrics(pattern, crop, drivers, noise))
        .collect()
}

fn simulated_raster(
    parcel: &Parcel,
    center: f64,
    resolution_m: f64,
    noise: &mut impl NoiseSource,
) -> Option<IndexRaster> {
    let bounds = parcel.bounds()?;
    let meters_per_unit = if parcel.crs.is_geographic() {
        crate::geometry::METERS_PER_DEGREE
    } else {
        1.0
    };
    let extent = bounds.width().max(bounds.height());
    if extent <= 0.0 {
        return None;
    }
    let nominal = resolution_m / meters_per_unit;
    let pixel_size = nominal.max(extent / SIMULATED_MAX_PIXELS_PER_SIDE as f64);
    let width = ((bounds.width() / pixel_size).ceil() as usize).max(1);
    let height = ((bounds.height() / pixel_size).ceil() as usize).max(1);

    let values = (0..width * height)
        .map(|_| (center + noise.gaussian(SIMULATED_PIXEL_JITTER)).clamp(0.0, 1.0))
        .collect();
    IndexRaster::new(width, height, bounds.min_x, bounds.max_y, pixel_size, values)
}

/// Index record of the simulated source.
///
/// The scene value is the crop's optimal NDVI scaled by [`SIMULATED_NDVI_FACTOR`] plus jitter;
/// a pixel raster around it is aggregated over the parcel so the record carries the same
/// statistics a provider would return. Always succeeds.
pub fn simulate_index_record(
    parcel: &Parcel,
    crop: &CropProfile,
    index: VegetationIndex,
    date_range: &DateRange,
    noise: &mut impl NoiseSource,
) -> IndexSourceRecord {
    let scene =
        (crop.optimal_ndvi * SIMULATED_NDVI_FACTOR + noise.gaussian(SIMULATED_SCENE_JITTER)).clamp(0.0, 1.0);
    let center = match index {
        VegetationIndex::Ndre => scene * crop.optimal_ndre / crop.optimal_ndvi,
        _ => scene,
    };

    let statistics = parcel.polygons.first().and_then(|polygon| {
        simulated_raster(parcel, center, crop.imagery.resolution_m, noise)
            .map(|raster| raster.zonal_statistics(polygon))
            .filter(|stats| stats.pixel_count > 0)
    });

    IndexSourceRecord {
        index,
        base_value: statistics.map_or(center, |s| s.mean),
        source: IndexSourceKind::Simulated,
        source_label: "Simulated data".to_string(),
        acquisition_date: date_range.end,
        scene_id: None,
        cloud_cover_percent: None,
        resolution_m: crop.imagery.resolution_m,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Crop;
    use crate::types::Crs;
    use chrono::NaiveDate;
    use geo::polygon;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(index: VegetationIndex, base_value: f64) -> IndexSourceRecord {
        IndexSourceRecord {
            index,
            base_value,
            source: IndexSourceKind::Simulated,
            source_label: "test".to_string(),
            acquisition_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            scene_id: None,
            cloud_cover_percent: None,
            resolution_m: 10.0,
            statistics: None,
        }
    }

    fn coord(x: f64, y: f64) -> Coordinate {
        Coordinate { x, y }
    }

    fn date_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
    }

    #[test]
    fn test_spatial_patterns_corners() {
        let patterns = spatial_patterns(&[coord(0.0, 0.0), coord(10.0, 0.0), coord(0.0, 10.0), coord(10.0, 10.0)]);
        let expected = [0.0, 0.6, 0.4, 1.0];
        for (p, e) in patterns.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spatial_patterns_constant_axis_is_half() {
        let patterns = spatial_patterns(&[coord(5.0, 0.0), coord(5.0, 10.0)]);
        assert!((patterns[0] - 0.3).abs() < 1e-12);
        assert!((patterns[1] - 0.7).abs() < 1e-12);

        let single = spatial_patterns(&[coord(1.0, 1.0)]);
        assert!((single[0] - 0.5).abs() < 1e-12);
        assert!(spatial_patterns(&[]).is_empty());
    }

    #[test]
    fn test_zone_metrics_without_noise() {
        let wheat = Crop::Wheat.profile();
        let metrics = zone_metrics(1.0, wheat, (0.7, 0.4), &mut NoNoise);
        // 3.5·0.7 + 3.5·0.6
        assert!((metrics.organic_matter - 4.55).abs() < 1e-12);
        // 0.3·0.8 + 0.3·0.4
        assert!((metrics.soil_moisture - 0.36).abs() < 1e-12);
        // 0.7·0.8 + 0.7·0.3
        assert!((metrics.ndvi - 0.77).abs() < 1e-12);
        // 0.4·0.8 + 0.4·0.3
        assert!((metrics.ndre - 0.44).abs() < 1e-12);
        let expected_npk = 0.4 * 0.77 + 0.3 * 0.44 + 0.2 * (4.55 / 8.0) + 0.1 * 0.36;
        assert!((metrics.npk_current - expected_npk).abs() < 1e-12);
    }

    #[test]
    fn test_index_drivers() {
        let wheat = Crop::Wheat.profile();
        let (ndvi, ndre) = index_drivers(&record(VegetationIndex::Ndvi, 0.63), wheat);
        assert!((ndvi - 0.63).abs() < 1e-12);
        assert!((ndre - 0.36).abs() < 1e-12);

        let (ndvi, ndre) = index_drivers(&record(VegetationIndex::Ndre, 0.36), wheat);
        assert!((ndvi - 0.63).abs() < 1e-12);
        assert!((ndre - 0.36).abs() < 1e-12);
    }

    #[test]
    fn test_higher_base_value_raises_canopy_metrics() {
        let wheat = Crop::Wheat.profile();
        let low = zone_metrics(0.5, wheat, index_drivers(&record(VegetationIndex::Ndvi, 0.3), wheat), &mut NoNoise);
        let high = zone_metrics(0.5, wheat, index_drivers(&record(VegetationIndex::Ndvi, 0.8), wheat), &mut NoNoise);
        assert!(high.ndvi > low.ndvi);
        assert!(high.ndre > low.ndre);
        assert_eq!(high.organic_matter, low.organic_matter);
    }

    #[test]
    fn test_metrics_stay_in_range_over_many_draws() {
        let mut noise = GaussianNoise::new(StdRng::seed_from_u64(7));
        for crop in Crop::ALL {
            let profile = crop.profile();
            for base in [0.0, 1.0] {
                let drivers = index_drivers(&record(VegetationIndex::Ndvi, base), profile);
                for _ in 0..10_000 {
                    for pattern in [0.0, 1.0] {
                        let m = zone_metrics(pattern, profile, drivers, &mut noise);
                        assert!((0.5..=8.0).contains(&m.organic_matter));
                        assert!((0.1..=0.8).contains(&m.soil_moisture));
                        assert!((0.1..=0.9).contains(&m.ndvi));
                        assert!((0.05..=0.7).contains(&m.ndre));
                        assert!((0.0..=1.0).contains(&m.npk_current));
                    }
                }
            }
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let wheat = Crop::Wheat.profile();
        let drivers = (0.6, 0.35);
        let mut a = GaussianNoise::new(StdRng::seed_from_u64(42));
        let mut b = GaussianNoise::new(StdRng::seed_from_u64(42));
        for pattern in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(
                zone_metrics(pattern, wheat, drivers, &mut a),
                zone_metrics(pattern, wheat, drivers, &mut b)
            );
        }
    }

    #[test]
    fn test_simulated_record_without_noise() {
        let parcel = Parcel::new(
            Crs::Projected { epsg: 32720 },
            vec![polygon![(x: 0.0, y: 0.0), (x: 500.0, y: 0.0), (x: 500.0, y: 300.0), (x: 0.0, y: 300.0)]],
        );
        let wheat = Crop::Wheat.profile();
        let record = simulate_index_record(&parcel, wheat, VegetationIndex::Ndvi, &date_range(), &mut NoNoise);
        assert_eq!(record.source, IndexSourceKind::Simulated);
        assert!((record.base_value - 0.63).abs() < 1e-9);
        assert_eq!(record.acquisition_date, date_range().end);
        assert!(record.scene_id.is_none());
        let stats = record.statistics.unwrap();
        // 10 m pixels over 500 m × 300 m
        assert_eq!(stats.pixel_count, 50 * 30);
        assert!(stats.std_dev < 1e-9);
    }

    #[test]
    fn test_simulated_record_caps_raster_size() {
        let parcel = Parcel::new(
            Crs::Projected { epsg: 32720 },
            vec![polygon![(x: 0.0, y: 0.0), (x: 50_000.0, y: 0.0), (x: 50_000.0, y: 50_000.0), (x: 0.0, y: 50_000.0)]],
        );
        let record = simulate_index_record(&parcel, Crop::Maize.profile(), VegetationIndex::Ndvi, &date_range(), &mut NoNoise);
        let stats = record.statistics.unwrap();
        assert!(stats.pixel_count <= SIMULATED_MAX_PIXELS_PER_SIDE * SIMULATED_MAX_PIXELS_PER_SIDE);
    }

    #[test]
    fn test_simulated_record_for_empty_parcel() {
        let parcel = Parcel::new(Crs::Geographic, vec![]);
        let record = simulate_index_record(&parcel, Crop::Wheat.profile(), VegetationIndex::Ndre, &date_range(), &mut NoNoise);
        assert!(record.statistics.is_none());
        assert!((record.base_value - 0.36).abs() < 1e-9);
    }
}
