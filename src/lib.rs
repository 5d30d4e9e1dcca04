pub mod divisor;
mod error;
pub mod metadata;
pub mod report;
pub mod solver;
pub mod storage_options;

pub use zarrs;

pub use error::{Error, Result};
pub use report::ChunkReport;
pub use solver::{ChunkShapeSolver, DEFAULT_ELEMENT_WIDTH, DEFAULT_TOLERANCE, compute};
pub use storage_options::StorageOptions;
