use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::general::irradiance::IrradianceTable;

/// Lower and upper bound of the fixed-cost band used when a bill does not
/// separate its non-reducible charges.
pub const FIXED_COST_FLOOR_BAND_EUR: (f64, f64) = (10.0, 15.0);

/// Reference band for judging the all-inclusive price of a contract, in EUR/kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssessmentBand {
    /// Prices below this are considered cheap.
    pub low: f64,
    /// Prices above this are considered expensive.
    pub high: f64,
}

impl Default for AssessmentBand {
    fn default() -> Self {
        Self {
            low: 0.25,
            high: 0.35,
        }
    }
}

/// Estimation parameters of the projection engine.
///
/// None of these are physical constants; they are the assumptions behind the
/// estimate and can be overridden from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub self_consumption_factor: f64, // Share of production used on site (battery + smart meter)
    pub fixed_cost_floor_eur: f64,    // Non-reducible monthly charges (grid fees, standing charges)
    pub allow_floor_outside_band: bool, // Accept a floor outside the 10-15 EUR band
    pub days_per_month: f64,          // Days used to turn daily production into monthly
    pub co2_kg_per_kwh: f64,          // Emission factor of grid electricity
    pub default_irradiance_hours: f64, // Sun-hours/day for provinces missing from the table
    pub assessment_band: AssessmentBand, // Reference prices for the contract assessment
    pub tax_deduction_rate: f64,      // Share of the investment recovered as tax deduction
    pub irradiance_table: Option<PathBuf>, // CSV or XLSX table replacing the built-in one
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            self_consumption_factor: 0.85,
            fixed_cost_floor_eur: 12.5,
            allow_floor_outside_band: false,
            days_per_month: 30.0,
            co2_kg_per_kwh: 0.25,
            default_irradiance_hours: 4.0,
            assessment_band: AssessmentBand::default(),
            tax_deduction_rate: 0.5,
            irradiance_table: None,
        }
    }
}

impl EngineConfig {
    /// Reads and validates a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse engine config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid engine config: {}", path.display()))?;

        info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Like [`EngineConfig::load`], but falls back to the defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "engine config not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.self_consumption_factor > 0.0 && self.self_consumption_factor <= 1.0,
            "self_consumption_factor must be in (0, 1], got {}",
            self.self_consumption_factor
        );
        ensure!(
            self.fixed_cost_floor_eur.is_finite() && self.fixed_cost_floor_eur >= 0.0,
            "fixed_cost_floor_eur must be a non-negative amount, got {}",
            self.fixed_cost_floor_eur
        );
        let (band_low, band_high) = FIXED_COST_FLOOR_BAND_EUR;
        ensure!(
            self.allow_floor_outside_band
                || (band_low..=band_high).contains(&self.fixed_cost_floor_eur),
            "fixed_cost_floor_eur must be between {} and {} EUR unless allow_floor_outside_band is set, got {}",
            band_low,
            band_high,
            self.fixed_cost_floor_eur
        );
        ensure!(
            self.days_per_month.is_finite() && self.days_per_month > 0.0,
            "days_per_month must be positive, got {}",
            self.days_per_month
        );
        ensure!(
            self.co2_kg_per_kwh.is_finite() && self.co2_kg_per_kwh >= 0.0,
            "co2_kg_per_kwh must be non-negative, got {}",
            self.co2_kg_per_kwh
        );
        ensure!(
            self.default_irradiance_hours.is_finite() && self.default_irradiance_hours > 0.0,
            "default_irradiance_hours must be positive, got {}",
            self.default_irradiance_hours
        );
        ensure!(
            self.assessment_band.low.is_finite()
                && self.assessment_band.high.is_finite()
                && self.assessment_band.low < self.assessment_band.high,
            "assessment_band.low must be below assessment_band.high, got {} and {}",
            self.assessment_band.low,
            self.assessment_band.high
        );
        ensure!(
            (0.0..=1.0).contains(&self.tax_deduction_rate),
            "tax_deduction_rate must be in [0, 1], got {}",
            self.tax_deduction_rate
        );
        Ok(())
    }

    /// Irradiance table to project with: the configured file, or the built-in table.
    pub fn load_irradiance_table(&self) -> Result<IrradianceTable> {
        match &self.irradiance_table {
            Some(path) => IrradianceTable::load(path),
            None => Ok(IrradianceTable::default()),
        }
    }
}
