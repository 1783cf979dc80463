use serde::Serialize;
use soleasy_model::investment::InvestmentCost;
use soleasy_model::projection::ProjectionResult;

use crate::general::finance::payback_years;
use crate::general::rounding::{round_unit_price, round_whole, round_years};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Where one month of consumption comes from once the kit is installed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySplit {
    pub grid_purchased_kwh: f64,
    pub self_consumed_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeCostPoint {
    pub month: u32,
    pub label: &'static str,
    pub current_cost_eur: f64,
    pub with_kit_cost_eur: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeSavingsPoint {
    pub year: u32,
    pub savings_eur: f64,
}

/// Rounded, user-facing figures of one estimate.
///
/// The price per kWh keeps three decimals, the payback period one; every
/// other amount is a whole number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFigures {
    pub province: String,
    pub cost_per_kwh: f64,
    pub monthly_consumption_kwh: f64,
    pub current_monthly_bill_eur: f64,
    pub monthly_production_kwh: f64,
    pub self_consumed_kwh: f64,
    pub new_monthly_bill_eur: f64,
    pub monthly_savings_eur: f64,
    pub annual_savings_eur: f64,
    pub decade_savings_eur: f64,
    pub monthly_co2_avoided_kg: f64,
    pub annual_co2_avoided_kg: f64,
    pub decade_co2_avoided_kg: f64,
    pub investment_total_eur: f64,
    pub investment_net_eur: f64,
    /// Tax deduction share behind `investment_net_eur`.
    pub deduction_rate: f64,
    pub payback_years: Option<f64>,
}

impl DisplayFigures {
    pub fn new(
        projection: &ProjectionResult,
        investment: &InvestmentCost,
        deduction_rate: f64,
    ) -> Self {
        DisplayFigures {
            province: projection.province.clone(),
            cost_per_kwh: round_unit_price(projection.cost_per_kwh),
            monthly_consumption_kwh: round_whole(projection.monthly_consumption_kwh),
            current_monthly_bill_eur: round_whole(projection.current_monthly_bill_eur),
            monthly_production_kwh: round_whole(projection.monthly_production_kwh),
            self_consumed_kwh: round_whole(projection.self_consumed_kwh),
            new_monthly_bill_eur: round_whole(projection.new_monthly_bill_eur),
            monthly_savings_eur: round_whole(projection.monthly_savings_eur),
            annual_savings_eur: round_whole(projection.annual_savings_eur),
            decade_savings_eur: round_whole(projection.decade_savings_eur),
            monthly_co2_avoided_kg: round_whole(projection.monthly_co2_avoided_kg),
            annual_co2_avoided_kg: round_whole(projection.annual_co2_avoided_kg),
            decade_co2_avoided_kg: round_whole(projection.decade_co2_avoided_kg),
            investment_total_eur: round_whole(investment.total),
            investment_net_eur: round_whole(investment.net_of_deduction(deduction_rate)),
            deduction_rate,
            payback_years: payback_years(investment.total, projection.annual_savings_eur)
                .map(round_years),
        }
    }

    pub fn payback_label(&self) -> String {
        format_payback(self.payback_years)
    }
}

/// "3.4 years", or "N/A" when the kit never pays back.
pub fn format_payback(years: Option<f64>) -> String {
    match years {
        Some(years) => format!("{:.1} years", years),
        None => "N/A".to_string(),
    }
}

/// Everything the result page shows for one estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unrounded payback period; `None` means not applicable.
    pub payback_years: Option<f64>,
    pub energy_split: EnergySplit,
    pub cumulative_cost: Vec<CumulativeCostPoint>,
    pub cumulative_savings: Vec<CumulativeSavingsPoint>,
    pub contract_assessment: String,
    pub figures: DisplayFigures,
}

pub fn energy_split(projection: &ProjectionResult) -> EnergySplit {
    EnergySplit {
        grid_purchased_kwh: (projection.monthly_consumption_kwh - projection.self_consumed_kwh)
            .max(0.0),
        self_consumed_kwh: projection.self_consumed_kwh,
    }
}

/// Twelve months of running cost, with and without the kit.
pub fn cumulative_cost(projection: &ProjectionResult) -> Vec<CumulativeCostPoint> {
    (1u32..)
        .zip(MONTH_LABELS)
        .map(|(month, label)| CumulativeCostPoint {
            month,
            label,
            current_cost_eur: projection.current_monthly_bill_eur * f64::from(month),
            with_kit_cost_eur: projection.new_monthly_bill_eur * f64::from(month),
        })
        .collect()
}

/// Ten years of accumulated savings.
pub fn cumulative_savings(projection: &ProjectionResult) -> Vec<CumulativeSavingsPoint> {
    (1..=10)
        .map(|year| CumulativeSavingsPoint {
            year,
            savings_eur: projection.annual_savings_eur * f64::from(year),
        })
        .collect()
}

/// Derives the display series and figures. Nothing here feeds back into the
/// projection or the investment.
pub fn build_report(
    projection: &ProjectionResult,
    investment: &InvestmentCost,
    deduction_rate: f64,
) -> Report {
    Report {
        payback_years: payback_years(investment.total, projection.annual_savings_eur),
        energy_split: energy_split(projection),
        cumulative_cost: cumulative_cost(projection),
        cumulative_savings: cumulative_savings(projection),
        contract_assessment: projection.contract_assessment.clone(),
        figures: DisplayFigures::new(projection, investment, deduction_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use soleasy_model::projection::IrradianceSource;

    fn projection() -> ProjectionResult {
        ProjectionResult {
            province: "RM".to_string(),
            irradiance_hours_per_day: 4.5,
            irradiance_source: IrradianceSource::Table,
            cost_per_kwh: 0.4,
            monthly_consumption_kwh: 150.0,
            current_monthly_bill_eur: 60.0,
            contract_assessment: "High".to_string(),
            monthly_production_kwh: 232.2,
            self_consumed_kwh: 150.0,
            monthly_savings_eur: 60.0,
            fixed_cost_floor_eur: 12.5,
            new_monthly_bill_eur: 12.5,
            monthly_co2_avoided_kg: 58.05,
            annual_savings_eur: 720.0,
            decade_savings_eur: 7200.0,
            annual_co2_avoided_kg: 696.6,
            decade_co2_avoided_kg: 6966.0,
        }
    }

    fn investment() -> InvestmentCost {
        InvestmentCost {
            hardware_cost: 2250.0,
            services_cost: 0.0,
            subtotal: 2250.0,
            vat: 225.0,
            total: 2475.0,
        }
    }

    #[test]
    fn test_cumulative_cost_series() {
        let series = cumulative_cost(&projection());
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].label, "Jan");
        assert_eq!(series[0].current_cost_eur, 60.0);
        assert_eq!(series[0].with_kit_cost_eur, 12.5);
        assert_eq!(series[11].month, 12);
        assert_eq!(series[11].label, "Dec");
        assert_eq!(series[11].current_cost_eur, 720.0);
        assert_eq!(series[11].with_kit_cost_eur, 150.0);
    }

    #[test]
    fn test_cumulative_savings_series() {
        let series = cumulative_savings(&projection());
        assert_eq!(series.len(), 10);
        assert_eq!(series[0], CumulativeSavingsPoint { year: 1, savings_eur: 720.0 });
        assert_eq!(series[9], CumulativeSavingsPoint { year: 10, savings_eur: 7200.0 });
    }

    #[test]
    fn test_energy_split_never_negative() {
        let split = energy_split(&projection());
        assert_eq!(split.grid_purchased_kwh, 0.0);
        assert_eq!(split.self_consumed_kwh, 150.0);

        let mut partial = projection();
        partial.self_consumed_kwh = 100.0;
        assert_eq!(energy_split(&partial).grid_purchased_kwh, 50.0);
    }

    #[test]
    fn test_report_payback() {
        let report = build_report(&projection(), &investment(), 0.5);
        assert_relative_eq!(report.payback_years.unwrap(), 3.4375);
        assert_eq!(report.figures.payback_years, Some(3.4));
        assert_eq!(report.figures.payback_label(), "3.4 years");
        assert_eq!(report.contract_assessment, "High");
    }

    #[test]
    fn test_payback_not_applicable_is_not_zero() {
        let mut flat = projection();
        flat.annual_savings_eur = 0.0;
        let report = build_report(&flat, &investment(), 0.5);
        assert_eq!(report.payback_years, None);
        assert_eq!(report.figures.payback_label(), "N/A");
    }

    #[test]
    fn test_display_rounding() {
        let figures = DisplayFigures::new(&projection(), &investment(), 0.5);
        assert_eq!(figures.cost_per_kwh, 0.4);
        assert_eq!(figures.monthly_production_kwh, 232.0);
        assert_eq!(figures.monthly_co2_avoided_kg, 58.0);
        assert_eq!(figures.annual_co2_avoided_kg, 697.0);
        assert_eq!(figures.new_monthly_bill_eur, 13.0);
        assert_eq!(figures.investment_total_eur, 2475.0);
        assert_eq!(figures.investment_net_eur, 1238.0);
        assert_eq!(figures.deduction_rate, 0.5);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = build_report(&projection(), &investment(), 0.5);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["energySplit"]["selfConsumedKwh"], 150.0);
        assert_eq!(json["cumulativeCost"][0]["label"], "Jan");
        assert_eq!(json["figures"]["paybackYears"], 3.4);
    }
}
