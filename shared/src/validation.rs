//! Input validation for analysis requests

use geo::algorithm::line_intersection::line_intersection;
use geo::{Area, LineString};

use crate::models::Parcel;
use crate::types::DateRange;

/// An input rejected before any processing starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
    /// Spanish message for the field dashboard
    pub message_es: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>, message_es: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            message_es: message_es.into(),
        }
    }
}

// ============================================================================
// Parcel
// ============================================================================

/// True when two non-adjacent edges of a closed ring touch or cross
fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    let edges: Vec<_> = ring.lines().filter(|l| l.start != l.end).collect();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // first and last edges share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            if line_intersection(edges[i], edges[j]).is_some() {
                return true;
            }
        }
    }
    false
}

/// A parcel must have at least one polygon, finite coordinates, simple rings and positive area
/// per polygon
pub fn validate_parcel(parcel: &Parcel) -> Result<(), ValidationError> {
    if parcel.polygons.is_empty() {
        return Err(ValidationError::new(
            "parcel",
            "Parcel boundary contains no polygons",
            "El límite de la parcela no contiene polígonos",
        ));
    }

    for (i, polygon) in parcel.polygons.iter().enumerate() {
        let finite = polygon
            .exterior()
            .coords()
            .chain(polygon.interiors().iter().flat_map(|r| r.coords()))
            .all(|c| c.x.is_finite() && c.y.is_finite());
        if !finite {
            return Err(ValidationError::new(
                "parcel",
                format!("Polygon {} has non-finite coordinates", i + 1),
                format!("El polígono {} tiene coordenadas no válidas", i + 1),
            ));
        }
        if polygon.exterior().0.len() < 4 {
            return Err(ValidationError::new(
                "parcel",
                format!("Polygon {} needs at least three vertices", i + 1),
                format!("El polígono {} necesita al menos tres vértices", i + 1),
            ));
        }
        let self_intersects = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .any(ring_self_intersects);
        if self_intersects {
            return Err(ValidationError::new(
                "parcel",
                format!("Polygon {} boundary crosses itself", i + 1),
                format!("El límite del polígono {} se cruza consigo mismo", i + 1),
            ));
        }
        if polygon.unsigned_area() <= 0.0 {
            return Err(ValidationError::new(
                "parcel",
                format!("Polygon {} has zero area", i + 1),
                format!("El polígono {} tiene área nula", i + 1),
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Request parameters
// ============================================================================

/// Default zone count limits
pub const MIN_ZONE_COUNT: u32 = 16;
pub const MAX_ZONE_COUNT: u32 = 48;
pub const DEFAULT_ZONE_COUNT: u32 = 32;

/// Zone count must lie in the configured inclusive range
pub fn validate_zone_count(zone_count: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if zone_count < min || zone_count > max {
        return Err(ValidationError::new(
            "zone_count",
            format!("Zone count must be between {} and {}", min, max),
            format!("La cantidad de zonas debe estar entre {} y {}", min, max),
        ));
    }
    Ok(())
}

/// Start must not be after end
pub fn validate_date_range(range: &DateRange) -> Result<(), ValidationError> {
    if !range.is_ordered() {
        return Err(ValidationError::new(
            "date_range",
            "Start date must not be after end date",
            "La fecha de inicio no puede ser posterior a la fecha de fin",
        ));
    }
    Ok(())
}
