//! Analysis pipeline services

pub mod analysis;
pub mod export;
pub mod index_source;

pub use analysis::AnalysisService;
pub use index_source::{Acquisition, IndexSource};
