pub mod extraction;
pub mod lead;
pub mod projection;
pub mod report;

use serde::Serialize;
use soleasy_model::bill::BillExtraction;
use soleasy_model::investment::InvestmentCost;
use soleasy_model::kit::Configuration;
use soleasy_model::projection::ProjectionResult;
use tracing::info;

use crate::error::EstimateError;
use crate::general::config::EngineConfig;
use crate::general::irradiance::IrradianceTable;
use crate::general::pricing::compute_investment;

use extraction::{BillDocument, BillExtractor, ExtractionRequest, analyze_bill};
use lead::{ContactDetails, FeasibilityChecklist, LeadError, LeadMessage, LeadRequest, compose_lead};
use projection::ProjectionEngine;
use report::{Report, build_report};

/// Outcome of one analysis: what the kit costs and what it saves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub configuration: Configuration,
    pub investment: InvestmentCost,
    pub bill: BillExtraction,
    pub projection: ProjectionResult,
    pub report: Report,
}

/// Runs configuration, bill extraction, projection and report in order.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    engine: ProjectionEngine,
}

impl Estimator {
    /// Builds an estimator, loading the configured irradiance table if any.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let table = config.load_irradiance_table()?;
        info!(provinces = table.len(), "irradiance table ready");
        Ok(Self::with_table(config, table))
    }

    pub fn with_table(config: EngineConfig, table: IrradianceTable) -> Self {
        Self {
            engine: ProjectionEngine::new(config, table),
        }
    }

    pub fn estimate(
        &self,
        configuration: &Configuration,
        extractor: &dyn BillExtractor,
        document: BillDocument,
    ) -> Result<Estimate, EstimateError> {
        let investment = compute_investment(configuration);
        let request = ExtractionRequest::new(document, configuration);
        let bill = analyze_bill(extractor, &request)?;
        self.estimate_with_bill(configuration, investment, bill)
    }

    /// Projection and report for bill facts that were already extracted.
    pub fn estimate_with_bill(
        &self,
        configuration: &Configuration,
        investment: InvestmentCost,
        bill: BillExtraction,
    ) -> Result<Estimate, EstimateError> {
        let projection = self.engine.project(
            &bill,
            configuration.panel.peak_kw(),
            configuration.battery.kwh(),
        )?;
        let report = build_report(
            &projection,
            &investment,
            self.engine.config().tax_deduction_rate,
        );

        Ok(Estimate {
            configuration: *configuration,
            investment,
            bill,
            projection,
            report,
        })
    }
}

impl Estimate {
    /// Survey request for this estimate, carrying the investment figures
    /// shown in the report.
    pub fn lead(
        &self,
        contact: &ContactDetails,
        checklist: FeasibilityChecklist,
    ) -> Result<LeadMessage, LeadError> {
        compose_lead(&LeadRequest {
            contact,
            checklist,
            configuration: &self.configuration,
            figures: &self.report.figures,
        })
    }
}
