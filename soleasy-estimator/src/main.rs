use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use soleasy_estimator::error::EstimateError;
use soleasy_estimator::estimate::extraction::{
    BillDocument, BillExtractor, DocumentKind, ExtractionRequest,
};
use soleasy_estimator::estimate::report::format_payback;
use soleasy_estimator::{EngineConfig, Estimate, Estimator, ExtractionError};
use soleasy_model::kit::Configuration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Replays a JSON response saved from the extraction service.
struct RecordedExtractor {
    path: PathBuf,
}

impl BillExtractor for RecordedExtractor {
    fn extract(&self, _request: &ExtractionRequest) -> Result<String, ExtractionError> {
        fs::read_to_string(&self.path).map_err(|e| {
            ExtractionError::Collaborator(format!("{}: {}", self.path.display(), e))
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    let outcome = match args.get(1).map(|s| s.as_str()) {
        Some("estimate") if args.len() >= 4 => run_estimate(
            Path::new(&args[2]),
            Path::new(&args[3]),
            args.get(4).map(Path::new),
            args.get(5).map(Path::new),
        ),
        Some("schema") => print_schema(),
        _ => {
            let program = args.first().map_or("soleasy-estimator", String::as_str);
            println!(
                "Usage:\n  {program} estimate <bill file> <extraction.json> [kit.json] [engine.toml]\n  {program} schema"
            );
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        if let Some(EstimateError::Extraction(extraction)) = e.downcast_ref::<EstimateError>() {
            eprintln!("{}", extraction.user_message());
        }
        std::process::exit(1);
    }
}

fn run_estimate(
    bill_path: &Path,
    extraction_path: &Path,
    kit_path: Option<&Path>,
    engine_path: Option<&Path>,
) -> Result<()> {
    let config = match engine_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let estimator = Estimator::new(config)?;

    let configuration = match kit_path {
        Some(path) => load_configuration(path)?,
        None => Configuration::default(),
    };

    let kind = DocumentKind::from_path(bill_path).ok_or_else(|| {
        EstimateError::from(ExtractionError::UnsupportedDocument(
            bill_path.display().to_string(),
        ))
    })?;
    let bytes = fs::read(bill_path)
        .with_context(|| format!("Failed to read bill: {}", bill_path.display()))?;
    let document = BillDocument::with_kind(kind, bytes).map_err(EstimateError::from)?;

    let extractor = RecordedExtractor {
        path: extraction_path.to_path_buf(),
    };
    let estimate = estimator.estimate(&configuration, &extractor, document)?;
    print_estimate(&estimate);
    Ok(())
}

fn load_configuration(path: &Path) -> Result<Configuration> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read kit configuration: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid kit configuration: {}", path.display()))
}

fn print_schema() -> Result<()> {
    let schema = ExtractionRequest::response_schema()?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_estimate(estimate: &Estimate) {
    let config = &estimate.configuration;
    let investment = &estimate.investment;
    let figures = &estimate.report.figures;

    println!("\n=== KIT ===");
    println!(
        "Battery: {} kWh, panels: {} x {} ({:.2} kWp, ~{} sqm)",
        config.battery.kwh(),
        config.panel.count(),
        config.panel.panel_type(),
        config.panel.peak_kw(),
        config.panel.required_area_sqm()
    );
    println!(
        "Investment: {:.0} EUR (VAT {:.0} EUR), net of {:.0}% deduction: {:.0} EUR",
        investment.total,
        investment.vat,
        figures.deduction_rate * 100.0,
        figures.investment_net_eur
    );

    println!("\n=== CURRENT BILL ({}) ===", figures.province);
    println!("Cost per kWh: {:.3} EUR", figures.cost_per_kwh);
    println!("Monthly consumption: {} kWh", figures.monthly_consumption_kwh);
    println!("Monthly bill: {} EUR", figures.current_monthly_bill_eur);
    println!("{}", estimate.report.contract_assessment);

    println!("\n=== WITH THE KIT ===");
    println!("Monthly production: {} kWh", figures.monthly_production_kwh);
    println!("Self-consumption: {} kWh", figures.self_consumed_kwh);
    println!("New monthly bill: {} EUR", figures.new_monthly_bill_eur);
    println!(
        "Savings: {} EUR/month, {} EUR/year, {} EUR in 10 years",
        figures.monthly_savings_eur, figures.annual_savings_eur, figures.decade_savings_eur
    );
    println!(
        "CO2 avoided: {} kg/year, {} kg in 10 years",
        figures.annual_co2_avoided_kg, figures.decade_co2_avoided_kg
    );
    println!("Payback: {}", format_payback(figures.payback_years));

    println!("\n=== CUMULATIVE COST ===");
    for point in &estimate.report.cumulative_cost {
        println!(
            "{:>3}: {:>8.0} EUR now, {:>8.0} EUR with the kit",
            point.label, point.current_cost_eur, point.with_kit_cost_eur
        );
    }
}
