//! Domain models for the parcel fertility analysis

mod analysis;
mod crop;
mod index;
mod parcel;

pub use analysis::*;
pub use crop::*;
pub use index::*;
pub use parcel::*;
