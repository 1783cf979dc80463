use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Where the irradiance used by a projection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "./projection.ts")]
pub enum IrradianceSource {
    /// The province was found in the irradiance table.
    Table,
    /// The province was not mapped and the configured default was used.
    Fallback,
}

/// Monthly, annual and ten-year outcome of switching to the kit.
///
/// Values are kept unrounded; display rounding happens when the figures are
/// rendered. Immutable once produced by the projection engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "./projection.ts")]
pub struct ProjectionResult {
    /// Province the irradiance lookup was made for.
    pub province: String,
    /// Average daily equivalent sun-hours used for production.
    pub irradiance_hours_per_day: f64,
    pub irradiance_source: IrradianceSource,

    // Current bill
    pub cost_per_kwh: f64,
    pub monthly_consumption_kwh: f64,
    pub current_monthly_bill_eur: f64,
    /// Short advisory judgement of the current contract price.
    pub contract_assessment: String,

    // With the kit
    pub monthly_production_kwh: f64,
    pub self_consumed_kwh: f64,
    pub monthly_savings_eur: f64,
    /// Non-reducible part of the bill applied as the lower bound of the new bill.
    pub fixed_cost_floor_eur: f64,
    pub new_monthly_bill_eur: f64,
    pub monthly_co2_avoided_kg: f64,

    // Long-term
    pub annual_savings_eur: f64,
    pub decade_savings_eur: f64,
    pub annual_co2_avoided_kg: f64,
    pub decade_co2_avoided_kg: f64,
}
