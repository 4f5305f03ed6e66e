//! HTTP handlers

pub mod analysis;
pub mod crop;
pub mod health;
pub mod source;

pub use analysis::{export_analysis, run_analysis};
pub use crop::{get_crop, list_crops};
pub use health::health_check;
pub use source::list_sources;
