use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// A field of the bill extraction that fails the acceptance checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BillFieldError {
    #[error("total cost must be a positive amount, got {0}")]
    NonPositiveTotalCost(f64),
    #[error("total consumption must be a positive number of kWh, got {0}")]
    NonPositiveConsumption(f64),
    #[error("billing period must cover at least one month, got {0}")]
    InvalidBillingPeriod(u32),
    #[error("province is missing")]
    EmptyProvince,
}

/// Raw bill facts as returned by the extraction service.
///
/// This is the response schema handed to the service. Nothing here has been
/// checked yet; convert into [`BillExtraction`] before use. Responses using
/// the legacy Italian field names are accepted too, and any extra fields a
/// legacy response carries are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "./bill.ts")]
pub struct BillExtractionPayload {
    /// Total billed amount in euro, taxes and charges included.
    pub total_cost: f64,
    /// Energy billed over the whole period, in kWh.
    pub total_consumption_kwh: f64,
    /// Number of months covered by the bill (1 monthly, 2 bimonthly, ...).
    pub billing_period_months: u32,
    /// Supply province, as printed on the bill (e.g. "RM").
    pub province: String,
}

impl<'de> Deserialize<'de> for BillExtractionPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let payload = match IncomingBill::deserialize(deserializer)? {
            IncomingBill::Current(bill) => BillExtractionPayload {
                total_cost: bill.total_cost,
                total_consumption_kwh: bill.total_consumption_kwh,
                billing_period_months: bill.billing_period_months,
                province: bill.province,
            },
            IncomingBill::Legacy(bill) => BillExtractionPayload {
                total_cost: bill.costo_totale,
                total_consumption_kwh: bill.consumo_kwh,
                billing_period_months: bill.periodo_fatturazione_mesi,
                province: bill.provincia_estratta,
            },
        };
        Ok(payload)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingBill {
    Current(CurrentBillFields),
    Legacy(LegacyBillFields),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentBillFields {
    total_cost: f64,
    total_consumption_kwh: f64,
    #[serde(deserialize_with = "whole_months")]
    billing_period_months: u32,
    province: String,
}

// Field names of older extraction responses
#[derive(Deserialize)]
struct LegacyBillFields {
    costo_totale: f64,
    consumo_kwh: f64,
    #[serde(deserialize_with = "whole_months")]
    periodo_fatturazione_mesi: u32,
    provincia_estratta: String,
}

/// Accepts `2` as well as `2.0`, but not `2.5` or negative values.
fn whole_months<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let months = f64::deserialize(deserializer)?;
    if months.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&months) {
        Ok(months as u32)
    } else {
        Err(de::Error::invalid_value(
            Unexpected::Float(months),
            &"a whole number of months",
        ))
    }
}

/// Bill facts that passed the acceptance checks.
///
/// `total_cost` and `total_consumption_kwh` both refer to the same
/// `billing_period_months`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BillExtractionPayload", into = "BillExtractionPayload")]
pub struct BillExtraction {
    total_cost: f64,
    total_consumption_kwh: f64,
    billing_period_months: u32,
    province: String,
}

impl BillExtraction {
    pub fn new(
        total_cost: f64,
        total_consumption_kwh: f64,
        billing_period_months: u32,
        province: impl Into<String>,
    ) -> Result<Self, BillFieldError> {
        if !(total_cost.is_finite() && total_cost > 0.0) {
            return Err(BillFieldError::NonPositiveTotalCost(total_cost));
        }
        if !(total_consumption_kwh.is_finite() && total_consumption_kwh > 0.0) {
            return Err(BillFieldError::NonPositiveConsumption(total_consumption_kwh));
        }
        if billing_period_months < 1 {
            return Err(BillFieldError::InvalidBillingPeriod(billing_period_months));
        }
        let province = province.into().trim().to_string();
        if province.is_empty() {
            return Err(BillFieldError::EmptyProvince);
        }

        Ok(BillExtraction {
            total_cost,
            total_consumption_kwh,
            billing_period_months,
            province,
        })
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_consumption_kwh(&self) -> f64 {
        self.total_consumption_kwh
    }

    pub fn billing_period_months(&self) -> u32 {
        self.billing_period_months
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    /// Consumption normalised to a single month.
    pub fn monthly_consumption_kwh(&self) -> f64 {
        self.total_consumption_kwh / f64::from(self.billing_period_months)
    }

    /// All-inclusive price paid per kWh.
    pub fn cost_per_kwh(&self) -> f64 {
        self.total_cost / self.total_consumption_kwh
    }

    /// Current bill normalised to a single month.
    pub fn monthly_bill_eur(&self) -> f64 {
        self.total_cost / f64::from(self.billing_period_months)
    }
}

impl TryFrom<BillExtractionPayload> for BillExtraction {
    type Error = BillFieldError;

    fn try_from(payload: BillExtractionPayload) -> Result<Self, Self::Error> {
        BillExtraction::new(
            payload.total_cost,
            payload.total_consumption_kwh,
            payload.billing_period_months,
            payload.province,
        )
    }
}

impl From<BillExtraction> for BillExtractionPayload {
    fn from(bill: BillExtraction) -> Self {
        BillExtractionPayload {
            total_cost: bill.total_cost,
            total_consumption_kwh: bill.total_consumption_kwh,
            billing_period_months: bill.billing_period_months,
            province: bill.province,
        }
    }
}
