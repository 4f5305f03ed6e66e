//! Parcel boundaries and the management zones cut from them

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::types::{Bounds, Coordinate, Crs, PolygonRings};

/// A farm parcel: one or more simple polygons in a named CRS, immutable once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub crs: Crs,
    pub polygons: Vec<Polygon<f64>>,
}

/// Wire form of a parcel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParcelInput {
    #[serde(default)]
    pub crs: Crs,
    pub polygons: Vec<PolygonRings>,
}

fn ring(points: &[[f64; 2]]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|[x, y]| Coord { x: *x, y: *y })
            .collect::<Vec<_>>(),
    )
}

fn rings(polygon: &Polygon<f64>) -> PolygonRings {
    let to_points = |line: &LineString<f64>| line.coords().map(|c| [c.x, c.y]).collect();
    PolygonRings {
        exterior: to_points(polygon.exterior()),
        interiors: polygon.interiors().iter().map(to_points).collect(),
    }
}

impl From<&PolygonRings> for Polygon<f64> {
    fn from(input: &PolygonRings) -> Self {
        Polygon::new(
            ring(&input.exterior),
            input.interiors.iter().map(|r| ring(r)).collect(),
        )
    }
}

impl From<&Polygon<f64>> for PolygonRings {
    fn from(polygon: &Polygon<f64>) -> Self {
        rings(polygon)
    }
}

impl From<&ParcelInput> for Parcel {
    fn from(input: &ParcelInput) -> Self {
        Parcel {
            crs: input.crs,
            polygons: input.polygons.iter().map(Polygon::from).collect(),
        }
    }
}

impl Parcel {
    pub fn new(crs: Crs, polygons: Vec<Polygon<f64>>) -> Self {
        Self { crs, polygons }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Bounding box over every polygon of the parcel
    pub fn bounds(&self) -> Option<Bounds> {
        MultiPolygon::new(self.polygons.clone())
            .bounding_rect()
            .map(|rect| Bounds {
                min_x: rect.min().x,
                min_y: rect.min().y,
                max_x: rect.max().x,
                max_y: rect.max().y,
            })
    }
}

/// A sub-polygon of the parcel treated uniformly for input application
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementZone {
    /// 1-based, in partition scan order
    pub id: u32,
    pub geometry: MultiPolygon<f64>,
    pub area_ha: f64,
    pub centroid: Coordinate,
}

impl ManagementZone {
    pub fn rings(&self) -> Vec<PolygonRings> {
        self.geometry.iter().map(rings).collect()
    }
}

/// Soil and canopy metrics derived for one zone
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ZoneMetrics {
    /// Organic matter, %, within [0.5, 8.0]
    pub organic_matter: f64,
    /// Volumetric soil moisture, fraction, within [0.1, 0.8]
    pub soil_moisture: f64,
    /// Within [0.1, 0.9]
    pub ndvi: f64,
    /// Within [0.05, 0.7]
    pub ndre: f64,
    /// Composite fertility index within [0, 1]
    pub npk_current: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_input() -> ParcelInput {
        ParcelInput {
            crs: Crs::Projected { epsg: 32720 },
            polygons: vec![PolygonRings {
                exterior: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]],
                interiors: vec![],
            }],
        }
    }

    #[test]
    fn test_parcel_from_input_closes_rings() {
        let parcel = Parcel::from(&square_input());
        assert_eq!(parcel.polygons.len(), 1);
        let exterior = parcel.polygons[0].exterior();
        assert!(exterior.is_closed());
        assert_eq!(exterior.0.len(), 5);
    }

    #[test]
    fn test_parcel_bounds() {
        let parcel = Parcel::from(&square_input());
        let bounds = parcel.bounds().unwrap();
        assert_eq!(bounds.to_array(), [0.0, 0.0, 10.0, 5.0]);
        assert_eq!(bounds.width(), 10.0);
        assert_eq!(bounds.height(), 5.0);
    }

    #[test]
    fn test_empty_parcel_has_no_bounds() {
        let parcel = Parcel::new(Crs::Geographic, vec![]);
        assert!(parcel.is_empty());
        assert!(parcel.bounds().is_none());
    }

    #[test]
    fn test_crs_defaults_to_geographic() {
        let input: ParcelInput = serde_json::from_value(serde_json::json!({
            "polygons": [{ "exterior": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]] }]
        }))
        .unwrap();
        assert_eq!(input.crs, Crs::Geographic);
        assert!(input.polygons[0].interiors.is_empty());
    }
}
