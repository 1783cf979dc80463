use soleasy_model::bill::BillExtraction;
use soleasy_model::projection::{IrradianceSource, ProjectionResult};
use tracing::{debug, warn};

use crate::error::ComputationError;
use crate::general::config::{AssessmentBand, EngineConfig};
use crate::general::irradiance::IrradianceTable;

pub const MONTHS_PER_YEAR: f64 = 12.0;
pub const YEARS_PER_DECADE: f64 = 10.0;

/// How the current contract price compares with the reference band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractAssessment {
    Low,
    Average,
    High,
}

impl ContractAssessment {
    pub fn classify(cost_per_kwh: f64, band: &AssessmentBand) -> Self {
        if cost_per_kwh < band.low {
            ContractAssessment::Low
        } else if cost_per_kwh > band.high {
            ContractAssessment::High
        } else {
            ContractAssessment::Average
        }
    }

    /// One or two sentences for the report; advisory only.
    pub fn describe(self, cost_per_kwh: f64, band: &AssessmentBand) -> String {
        match self {
            ContractAssessment::Low => format!(
                "At {:.3} EUR/kWh your contract is cheaper than the reference range ({:.2}-{:.2} EUR/kWh). \
                 Self-produced energy still lowers the bill, but savings per kWh will be smaller.",
                cost_per_kwh, band.low, band.high
            ),
            ContractAssessment::Average => format!(
                "At {:.3} EUR/kWh your contract is in line with the reference range ({:.2}-{:.2} EUR/kWh).",
                cost_per_kwh, band.low, band.high
            ),
            ContractAssessment::High => format!(
                "At {:.3} EUR/kWh your contract is more expensive than the reference range ({:.2}-{:.2} EUR/kWh). \
                 It is worth comparing offers, and every self-consumed kWh saves more.",
                cost_per_kwh, band.low, band.high
            ),
        }
    }
}

/// Turns validated bill facts and a kit size into a savings and emissions projection.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    config: EngineConfig,
    irradiance: IrradianceTable,
}

impl ProjectionEngine {
    pub fn new(config: EngineConfig, irradiance: IrradianceTable) -> Self {
        Self { config, irradiance }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Projects monthly, annual and decade figures for one bill.
    ///
    /// `battery_kwh` is context only: the self-consumption factor already
    /// accounts for the battery. Any non-finite intermediate value or broken
    /// invariant aborts the whole projection.
    pub fn project(
        &self,
        bill: &BillExtraction,
        panel_peak_kw: f64,
        battery_kwh: f64,
    ) -> Result<ProjectionResult, ComputationError> {
        let config = &self.config;
        let panel_peak_kw = non_negative("panel peak power", panel_peak_kw)?;
        let battery_kwh = non_negative("battery capacity", battery_kwh)?;

        // 1. Irradiance, with fallback for unmapped provinces
        let lookup = self
            .irradiance
            .resolve(bill.province(), config.default_irradiance_hours);
        if lookup.source == IrradianceSource::Fallback {
            warn!(
                province = bill.province(),
                fallback_hours = lookup.hours_per_day,
                "province not in irradiance table, using default"
            );
        }
        let irradiance_hours = non_negative("irradiance", lookup.hours_per_day)?;

        // Current bill, normalised to one month
        let cost_per_kwh = finite("cost per kWh", bill.cost_per_kwh())?;
        let monthly_consumption_kwh = finite("monthly consumption", bill.monthly_consumption_kwh())?;
        let current_monthly_bill_eur = finite("current monthly bill", bill.monthly_bill_eur())?;

        // 2. Production
        let monthly_production_kwh = finite(
            "monthly production",
            panel_peak_kw * irradiance_hours * config.days_per_month,
        )?;

        // 3. Self-consumption, capped by the production share and by what is actually used
        let production_cap_kwh = config.self_consumption_factor * monthly_production_kwh;
        let self_consumed_kwh = finite(
            "self-consumed energy",
            production_cap_kwh.min(monthly_consumption_kwh),
        )?;
        ensure_invariant(
            self_consumed_kwh >= 0.0,
            || format!("self-consumption is negative ({self_consumed_kwh} kWh)"),
        )?;
        ensure_invariant(self_consumed_kwh <= monthly_consumption_kwh, || {
            format!(
                "self-consumption {self_consumed_kwh} kWh exceeds consumption {monthly_consumption_kwh} kWh"
            )
        })?;
        ensure_invariant(self_consumed_kwh <= production_cap_kwh, || {
            format!(
                "self-consumption {self_consumed_kwh} kWh exceeds production cap {production_cap_kwh} kWh"
            )
        })?;

        // 4. Savings
        let monthly_savings_eur = finite("monthly savings", self_consumed_kwh * cost_per_kwh)?;

        // 5-6. New bill, never below the non-reducible charges
        let fixed_cost_floor_eur = finite("fixed cost floor", config.fixed_cost_floor_eur)?;
        let new_monthly_bill_eur = finite(
            "new monthly bill",
            fixed_cost_floor_eur.max(current_monthly_bill_eur - monthly_savings_eur),
        )?;
        ensure_invariant(new_monthly_bill_eur >= fixed_cost_floor_eur, || {
            format!(
                "new bill {new_monthly_bill_eur} EUR is below the fixed cost floor {fixed_cost_floor_eur} EUR"
            )
        })?;

        // 7. Emissions
        let monthly_co2_avoided_kg = finite(
            "monthly CO2 avoided",
            monthly_production_kwh * config.co2_kg_per_kwh,
        )?;

        // 8. Linear scale-up, no discounting or degradation
        let annual_savings_eur = finite("annual savings", monthly_savings_eur * MONTHS_PER_YEAR)?;
        let decade_savings_eur = finite("decade savings", annual_savings_eur * YEARS_PER_DECADE)?;
        let annual_co2_avoided_kg =
            finite("annual CO2 avoided", monthly_co2_avoided_kg * MONTHS_PER_YEAR)?;
        let decade_co2_avoided_kg =
            finite("decade CO2 avoided", annual_co2_avoided_kg * YEARS_PER_DECADE)?;

        // 9. Advisory contract assessment
        let band = &config.assessment_band;
        let contract_assessment =
            ContractAssessment::classify(cost_per_kwh, band).describe(cost_per_kwh, band);

        debug!(
            province = %lookup.province,
            irradiance_hours,
            panel_peak_kw,
            battery_kwh,
            monthly_production_kwh,
            self_consumed_kwh,
            monthly_savings_eur,
            new_monthly_bill_eur,
            "computed projection"
        );

        Ok(ProjectionResult {
            province: lookup.province,
            irradiance_hours_per_day: irradiance_hours,
            irradiance_source: lookup.source,
            cost_per_kwh,
            monthly_consumption_kwh,
            current_monthly_bill_eur,
            contract_assessment,
            monthly_production_kwh,
            self_consumed_kwh,
            monthly_savings_eur,
            fixed_cost_floor_eur,
            new_monthly_bill_eur,
            monthly_co2_avoided_kg,
            annual_savings_eur,
            decade_savings_eur,
            annual_co2_avoided_kg,
            decade_co2_avoided_kg,
        })
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), IrradianceTable::default())
    }
}

fn finite(quantity: &'static str, value: f64) -> Result<f64, ComputationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputationError::NonFinite { quantity, value })
    }
}

fn non_negative(quantity: &'static str, value: f64) -> Result<f64, ComputationError> {
    let value = finite(quantity, value)?;
    ensure_invariant(value >= 0.0, || format!("{quantity} is negative ({value})"))?;
    Ok(value)
}

fn ensure_invariant(
    holds: bool,
    detail: impl FnOnce() -> String,
) -> Result<(), ComputationError> {
    if holds {
        Ok(())
    } else {
        Err(ComputationError::Invariant { detail: detail() })
    }
}
