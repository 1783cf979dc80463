pub mod error;
pub mod estimate;
pub mod general;

// Re-export commonly used items for convenience
pub use error::{ComputationError, EstimateError, ExtractionError};
pub use estimate::extraction::{BillDocument, BillExtractor, ExtractionRequest};
pub use estimate::projection::ProjectionEngine;
pub use estimate::{Estimate, Estimator};
pub use general::config::EngineConfig;
