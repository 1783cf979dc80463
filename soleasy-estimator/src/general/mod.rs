pub mod config;
pub mod finance;
pub mod irradiance;
pub mod pricing;
pub mod rounding;

pub use config::{AssessmentBand, EngineConfig};
pub use finance::payback_years;
pub use irradiance::{IrradianceLookup, IrradianceTable};
pub use pricing::compute_investment;
