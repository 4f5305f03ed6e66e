//! Common types used across the platform

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// EPSG code of WGS 84 geographic coordinates
pub const WGS84_EPSG: u32 = 4326;

/// Coordinate reference system of a parcel boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Crs {
    /// Longitude/latitude in degrees (EPSG:4326)
    #[default]
    Geographic,
    /// Planar coordinates in metres
    Projected { epsg: u32 },
}

impl Crs {
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Geographic => WGS84_EPSG,
            Crs::Projected { epsg } => *epsg,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Geographic)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// A single polygon as plain coordinate rings, the wire form of a parcel boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolygonRings {
    pub exterior: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interiors: Vec<Vec<[f64; 2]>>,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// `[min_x, min_y, max_x, max_y]`, the order provider APIs expect
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Date range for imagery queries (inclusive)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Calendar months (1-12) touched by the range
    pub fn months(&self) -> Vec<u32> {
        let mut months = Vec::new();
        let mut year = self.start.year();
        let mut month = self.start.month();
        while (year, month) <= (self.end.year(), self.end.month()) {
            if !months.contains(&month) {
                months.push(month);
            }
            if months.len() == 12 {
                break;
            }
            if month == 12 {
                month = 1;
                year += 1;
            } else {
                month += 1;
            }
        }
        months
    }
}

/// Point in parcel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}
