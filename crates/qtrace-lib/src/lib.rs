pub mod analysis;
pub mod edf;
pub mod lod;
pub mod signal;

pub use analysis::*;
pub use lod::*;
pub use signal::*;
