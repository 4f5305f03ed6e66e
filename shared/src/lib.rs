//! Shared domain core for the parcel fertility mapping platform
//!
//! Pure, synchronous building blocks shared by the backend service and the browser (via WASM):
//! parcel partitioning, area conversion, zonal statistics, metric synthesis, dose
//! recommendations and categorization.

pub mod categorize;
pub mod geometry;
pub mod models;
pub mod palette;
pub mod recommendation;
pub mod stats;
pub mod synthesis;
pub mod types;
pub mod validation;
pub mod zonal;

pub use categorize::*;
pub use geometry::*;
pub use models::*;
pub use palette::*;
pub use recommendation::*;
pub use stats::*;
pub use synthesis::*;
pub use types::*;
pub use validation::*;
pub use zonal::*;
