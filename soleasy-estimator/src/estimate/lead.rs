use soleasy_model::kit::{Configuration, Installation};
use thiserror::Error;

use crate::estimate::report::DisplayFigures;

pub const LEAD_SUBJECT: &str = "SOLEASY CONTACT";

const SECTION_RULE: &str = "========================================";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeadError {
    #[error("the privacy policy has not been accepted")]
    PrivacyNotAccepted,
    #[error("not every feasibility check has been confirmed")]
    FeasibilityNotConfirmed,
    #[error("an email address is required")]
    MissingEmail,
    #[error("a phone number is required")]
    MissingPhone,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
    pub privacy_accepted: bool,
}

/// On-site conditions the customer confirms before asking for a survey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeasibilityChecklist {
    pub meter_suitable: bool,  // Bidirectional meter
    pub space_available: bool, // Room for the panel array
    pub good_exposure: bool,
    pub outlet_nearby: bool,
}

impl FeasibilityChecklist {
    pub fn all_confirmed(&self) -> bool {
        self.meter_suitable && self.space_available && self.good_exposure && self.outlet_nearby
    }
}

/// Plain-text message for the sales inbox.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadMessage {
    pub subject: String,
    pub body: String,
}

pub struct LeadRequest<'a> {
    pub contact: &'a ContactDetails,
    pub checklist: FeasibilityChecklist,
    pub configuration: &'a Configuration,
    pub figures: &'a DisplayFigures,
}

/// Builds the survey request. Investment figures come from the report as
/// shown to the customer, never recomputed.
pub fn compose_lead(request: &LeadRequest) -> Result<LeadMessage, LeadError> {
    let contact = request.contact;
    if !contact.privacy_accepted {
        return Err(LeadError::PrivacyNotAccepted);
    }
    if !request.checklist.all_confirmed() {
        return Err(LeadError::FeasibilityNotConfirmed);
    }
    if is_blank(&contact.email) {
        return Err(LeadError::MissingEmail);
    }
    if is_blank(&contact.phone) {
        return Err(LeadError::MissingPhone);
    }

    let config = request.configuration;
    let figures = request.figures;
    let panel = config.panel;
    let mut lines = vec![
        "New contact and survey request from the SOLEASY estimator.".to_string(),
        String::new(),
    ];

    section(&mut lines, "CUSTOMER");
    lines.push(format!("- Province: {}", figures.province));
    lines.push(format!("- Email: {}", text_or(&contact.email, "-")));
    lines.push(format!("- Phone: {}", text_or(&contact.phone, "-")));
    lines.push(format!(
        "- Referral code: {}",
        text_or(&contact.referral_code, "None")
    ));

    section(&mut lines, "FEASIBILITY (confirmed by the customer)");
    lines.push("- Bidirectional meter: Yes".to_string());
    lines.push(format!(
        "- Available space (~{} sqm): Yes",
        panel.required_area_sqm()
    ));
    lines.push("- Good solar exposure: Yes".to_string());
    lines.push("- Outlet nearby: Yes".to_string());

    section(&mut lines, "CONFIGURATION");
    lines.push(format!("- Storage battery: {} kWh", config.battery.kwh()));
    lines.push(format!(
        "- Panels: {} x {} ({} W)",
        panel.count(),
        panel.panel_type().label(),
        panel.panel_type().watts_per_panel()
    ));
    lines.push("- Services:".to_string());
    lines.push(format!(
        "  - Grid registration: {}",
        yes_no(config.services.registration)
    ));
    lines.push(format!(
        "  - Compliance declaration: {}",
        yes_no(config.services.compliance)
    ));
    let installation = match config.services.installation {
        Installation::None => "None",
        other => other.label(),
    };
    lines.push(format!("  - Installation: {installation}"));

    section(&mut lines, "INVESTMENT");
    lines.push(format!(
        "- Total investment (VAT incl.): {}",
        euro(figures.investment_total_eur)
    ));
    lines.push(format!(
        "- Estimated net cost ({:.0}% deduction): {}",
        figures.deduction_rate * 100.0,
        euro(figures.investment_net_eur)
    ));
    lines.push(format!("- Estimated payback: {}", figures.payback_label()));

    section(&mut lines, "BILL ANALYSIS");
    lines.push(format!("- Current cost per kWh: {:.3} EUR", figures.cost_per_kwh));
    lines.push(format!(
        "- Current monthly consumption: {} kWh",
        figures.monthly_consumption_kwh
    ));
    lines.push(format!(
        "- Current monthly bill: {}",
        euro(figures.current_monthly_bill_eur)
    ));
    lines.push("---".to_string());
    lines.push(format!(
        "- Estimated monthly PV production: {} kWh",
        figures.monthly_production_kwh
    ));
    lines.push(format!(
        "- Estimated self-consumption: {} kWh",
        figures.self_consumed_kwh
    ));
    lines.push(format!(
        "- Estimated new monthly bill: {}",
        euro(figures.new_monthly_bill_eur)
    ));
    lines.push("---".to_string());
    lines.push(format!(
        "- ESTIMATED MONTHLY SAVINGS: {}",
        euro(figures.monthly_savings_eur)
    ));
    lines.push(format!(
        "- ESTIMATED ANNUAL SAVINGS: {}",
        euro(figures.annual_savings_eur)
    ));
    lines.push(format!(
        "- ESTIMATED 10-YEAR SAVINGS: {}",
        euro(figures.decade_savings_eur)
    ));
    lines.push("---".to_string());
    lines.push(format!(
        "- CO2 avoided per year: {} kg",
        figures.annual_co2_avoided_kg
    ));
    lines.push(String::new());
    lines.push("Please contact the customer to schedule a survey.".to_string());

    Ok(LeadMessage {
        subject: LEAD_SUBJECT.to_string(),
        body: lines.join("\n"),
    })
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(SECTION_RULE.to_string());
    lines.push(title.to_string());
    lines.push(SECTION_RULE.to_string());
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|text| text.trim().is_empty())
}

fn text_or<'a>(value: &'a Option<String>, empty: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(empty)
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn euro(amount: f64) -> String {
    format!("{:.0} EUR", amount.round())
}
