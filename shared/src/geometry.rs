//! Parcel geometry: grid partitioning into management zones and area in hectares

use geo::{Area, BooleanOps, BoundingRect, Centroid, Coord, MultiPolygon, Polygon, Rect};

use crate::models::{ManagementZone, Parcel};
use crate::types::{Coordinate, Crs};

/// Square metres per hectare
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Metres per degree used to convert planar degree areas, exact only near one reference latitude
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Grid dimensions `(rows, cols)` for a target zone count
pub fn grid_dimensions(target_zone_count: u32) -> (u32, u32) {
    if target_zone_count == 0 {
        return (0, 0);
    }
    let cols = (target_zone_count as f64).sqrt().ceil() as u32;
    let rows = target_zone_count.div_ceil(cols);
    (rows, cols)
}

/// Area of a planar shape in hectares under the given CRS
pub fn hectares(area_in_crs_units: f64, crs: Crs) -> f64 {
    let square_meters = if crs.is_geographic() {
        area_in_crs_units * METERS_PER_DEGREE * METERS_PER_DEGREE
    } else {
        area_in_crs_units
    };
    square_meters / SQUARE_METERS_PER_HECTARE
}

/// Area of each parcel polygon in hectares, in input order
pub fn area_hectares(parcel: &Parcel) -> Vec<f64> {
    parcel
        .polygons
        .iter()
        .map(|polygon| hectares(polygon.unsigned_area(), parcel.crs))
        .collect()
}

fn cell(bounds: &Rect<f64>, row: u32, col: u32, rows: u32, cols: u32) -> Polygon<f64> {
    let width = bounds.width() / cols as f64;
    let height = bounds.height() / rows as f64;
    let min = Coord {
        x: bounds.min().x + col as f64 * width,
        y: bounds.min().y + row as f64 * height,
    };
    let max = Coord {
        x: min.x + width,
        y: min.y + height,
    };
    Rect::new(min, max).to_polygon()
}

/// Split the parcel's first polygon into at most `target_zone_count` grid cells clipped to its boundary.
///
/// Cells are scanned row-major from the bounding box's minimum corner; a cell becomes a zone only
/// when its intersection with the polygon has positive area, so concave or irregular boundaries
/// can yield fewer zones than requested. Ids run 1..=K in scan order. Never fails: an empty
/// parcel or a degenerate polygon yields no zones.
pub fn partition(parcel: &Parcel, target_zone_count: u32) -> Vec<ManagementZone> {
    let Some(polygon) = parcel.polygons.first() else {
        return Vec::new();
    };
    let Some(bounds) = polygon.bounding_rect() else {
        return Vec::new();
    };
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Vec::new();
    }

    let (rows, cols) = grid_dimensions(target_zone_count);
    let mut zones = Vec::new();
    let mut attempted = 0;

    'scan: for row in 0..rows {
        for col in 0..cols {
            if attempted >= target_zone_count {
                break 'scan;
            }
            attempted += 1;

            let clipped: MultiPolygon<f64> = polygon.intersection(&cell(&bounds, row, col, rows, cols));
            let area = clipped.unsigned_area();
            if clipped.0.is_empty() || area <= 0.0 {
                continue;
            }
            let Some(centroid) = clipped.centroid() else {
                continue;
            };

            zones.push(ManagementZone {
                id: zones.len() as u32 + 1,
                area_ha: hectares(area, parcel.crs),
                centroid: Coordinate {
                    x: centroid.x(),
                    y: centroid.y(),
                },
                geometry: clipped,
            });
        }
    }

    zones
}
