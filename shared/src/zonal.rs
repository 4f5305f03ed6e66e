//! Zonal statistics of an index raster over a polygon

use geo::{Contains, Point, Polygon};

use crate::models::ZonalStatistics;

/// North-up index raster: row 0 is the northern edge
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRaster {
    pub width: usize,
    pub height: usize,
    /// x of the western edge
    pub origin_x: f64,
    /// y of the northern edge
    pub origin_y: f64,
    pub pixel_size: f64,
    /// Row-major, `width * height` values
    pub values: Vec<f64>,
    pub no_data: Option<f64>,
}

impl IndexRaster {
    pub fn new(
        width: usize,
        height: usize,
        origin_x: f64,
        origin_y: f64,
        pixel_size: f64,
        values: Vec<f64>,
    ) -> Option<Self> {
        if values.len() != width * height || pixel_size <= 0.0 {
            return None;
        }
        Some(Self {
            width,
            height,
            origin_x,
            origin_y,
            pixel_size,
            values,
            no_data: None,
        })
    }

    pub fn with_no_data(mut self, no_data: f64) -> Self {
        self.no_data = Some(no_data);
        self
    }

    fn pixel_center(&self, row: usize, col: usize) -> Point<f64> {
        Point::new(
            self.origin_x + (col as f64 + 0.5) * self.pixel_size,
            self.origin_y - (row as f64 + 0.5) * self.pixel_size,
        )
    }

    fn is_valid(&self, value: f64) -> bool {
        value.is_finite() && self.no_data.map_or(true, |nd| value != nd)
    }

    /// Statistics of the valid pixels whose centre lies inside the polygon.
    /// With no such pixels every field is zero.
    pub fn zonal_statistics(&self, polygon: &Polygon<f64>) -> ZonalStatistics {
        let mut inside = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                let value = self.values[row * self.width + col];
                if self.is_valid(value) && polygon.contains(&self.pixel_center(row, col)) {
                    inside.push(value);
                }
            }
        }
        summarize_pixels(inside)
    }
}

/// Mean, population standard deviation, extremes and median of a pixel sample
pub fn summarize_pixels(mut values: Vec<f64>) -> ZonalStatistics {
    if values.is_empty() {
        return ZonalStatistics::default();
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    };

    ZonalStatistics {
        mean,
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[n - 1],
        median,
        pixel_count: n,
    }
}
