use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Up-front cost of a kit configuration, in euro.
///
/// Always derived from a `Configuration` and replaced whenever the
/// configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "./investment.ts")]
pub struct InvestmentCost {
    /// Battery plus panel array.
    pub hardware_cost: f64,
    /// Registration, compliance and installation services.
    pub services_cost: f64,
    pub subtotal: f64,
    /// VAT on the subtotal.
    pub vat: f64,
    /// Subtotal plus VAT.
    pub total: f64,
}

impl InvestmentCost {
    /// Estimated net cost once the home-renovation tax deduction is recovered.
    ///
    /// `deduction_rate` is the share of the total given back over the deduction
    /// period (0.5 for the 50 % scheme).
    pub fn net_of_deduction(&self, deduction_rate: f64) -> f64 {
        self.total * (1.0 - deduction_rate)
    }
}
