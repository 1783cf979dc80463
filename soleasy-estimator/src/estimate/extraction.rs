use std::path::Path;

use soleasy_model::bill::{BillExtraction, BillExtractionPayload};
use soleasy_model::kit::Configuration;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::error::ExtractionError;

/// File formats the extraction service can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Png,
    Jpeg,
    Webp,
    Pdf,
}

impl DocumentKind {
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(DocumentKind::Png),
            "image/jpeg" | "image/jpg" => Some(DocumentKind::Jpeg),
            "image/webp" => Some(DocumentKind::Webp),
            "application/pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(DocumentKind::Png),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            "webp" => Some(DocumentKind::Webp),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Webp => "image/webp",
            DocumentKind::Pdf => "application/pdf",
        }
    }
}

/// A photographed or scanned utility bill.
#[derive(Debug, Clone, PartialEq)]
pub struct BillDocument {
    kind: DocumentKind,
    bytes: Vec<u8>,
}

impl BillDocument {
    pub fn new(media_type: &str, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        let kind = DocumentKind::from_media_type(media_type)
            .ok_or_else(|| ExtractionError::UnsupportedDocument(media_type.to_string()))?;
        Self::with_kind(kind, bytes)
    }

    pub fn with_kind(kind: DocumentKind, bytes: Vec<u8>) -> Result<Self, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        Ok(BillDocument { kind, bytes })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Kit details passed along with the document as context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KitContext {
    pub panel_peak_kw: f64,
    pub battery_kwh: f64,
}

impl KitContext {
    pub fn from_configuration(config: &Configuration) -> Self {
        KitContext {
            panel_peak_kw: config.panel.peak_kw(),
            battery_kwh: config.battery.kwh(),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{:.2} kWp of panels, {} kWh battery, 800 W inverter with smart meter",
            self.panel_peak_kw, self.battery_kwh
        )
    }
}

/// Everything the extraction service receives for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub document: BillDocument,
    pub kit: KitContext,
}

impl ExtractionRequest {
    pub fn new(document: BillDocument, config: &Configuration) -> Self {
        ExtractionRequest {
            document,
            kit: KitContext::from_configuration(config),
        }
    }

    /// Instructions for the service. Only raw bill facts are asked for; all
    /// arithmetic happens locally.
    pub fn instructions(&self) -> String {
        format!(
            "Read the attached electricity bill ({media_type}).\n\
             The customer is evaluating a photovoltaic kit: {kit}.\n\
             Extract only the facts printed on the bill:\n\
             1. totalCost: the total amount due in euro, including every tax and charge.\n\
             2. totalConsumptionKwh: the energy billed over the whole period, in kWh.\n\
             3. billingPeriodMonths: the number of months the bill covers (1 monthly, 2 bimonthly, ...).\n\
             4. province: the supply province code (e.g. \"RM\"); if absent, use the province of the customer's address.\n\
             Do not compute savings, production or any other derived value.\n\
             Answer with JSON only, following the response schema.",
            media_type = self.document.kind().media_type(),
            kit = self.kit.describe(),
        )
    }

    /// JSON schema of the expected response.
    pub fn response_schema() -> serde_json::Result<serde_json::Value> {
        let (_, schema) = BillExtractionPayload::schema();
        serde_json::to_value(schema)
    }
}

/// The external document-understanding service.
///
/// Implementations return the raw JSON text produced by the service; parsing
/// and validation stay on this side of the boundary.
pub trait BillExtractor {
    fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractionError>;
}

/// Parses and validates the service output.
///
/// A Markdown code fence around the JSON is tolerated. Anything that is not a
/// complete, valid set of bill facts is rejected as a whole.
pub fn parse_extraction(raw: &str) -> Result<BillExtraction, ExtractionError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(ExtractionError::NoData);
    }

    let payload: BillExtractionPayload = serde_json::from_str(body)?;
    let bill = BillExtraction::try_from(payload)?;
    Ok(bill)
}

/// Runs the extraction service and returns the validated bill facts.
pub fn analyze_bill(
    extractor: &dyn BillExtractor,
    request: &ExtractionRequest,
) -> Result<BillExtraction, ExtractionError> {
    let raw = extractor.extract(request).inspect_err(|err| {
        warn!(error = %err, "bill extraction service failed");
    })?;

    let bill = parse_extraction(&raw).inspect_err(|err| {
        warn!(error = %err, "rejected bill extraction");
    })?;

    debug!(
        province = bill.province(),
        total_cost = bill.total_cost(),
        total_consumption_kwh = bill.total_consumption_kwh(),
        billing_period_months = bill.billing_period_months(),
        "accepted bill extraction"
    );
    Ok(bill)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use soleasy_model::bill::BillFieldError;
    use soleasy_model::kit::{BatteryCapacity, PanelArray, PanelType};

    struct CannedExtractor(Result<&'static str, &'static str>);

    impl BillExtractor for CannedExtractor {
        fn extract(&self, _request: &ExtractionRequest) -> Result<String, ExtractionError> {
            self.0
                .map(str::to_string)
                .map_err(|message| ExtractionError::Collaborator(message.to_string()))
        }
    }

    fn request() -> ExtractionRequest {
        let document = BillDocument::new("image/png", vec![0x89, b'P', b'N', b'G']).unwrap();
        ExtractionRequest::new(document, &Configuration::default())
    }

    #[test]
    fn test_parse_valid_payload() {
        let bill = parse_extraction(
            r#"{"totalCost": 120, "totalConsumptionKwh": 300, "billingPeriodMonths": 2, "province": "RM"}"#,
        )
        .unwrap();
        assert_eq!(bill.province(), "RM");
        assert_eq!(bill.monthly_consumption_kwh(), 150.0);
    }

    #[test]
    fn test_parse_fenced_payload() {
        let raw = "```json\n{\"totalCost\": 80.5, \"totalConsumptionKwh\": 230, \"billingPeriodMonths\": 1, \"province\": \"MI\"}\n```";
        let bill = parse_extraction(raw).unwrap();
        assert_eq!(bill.total_cost(), 80.5);
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed() {
        assert!(matches!(parse_extraction("   "), Err(ExtractionError::NoData)));
        assert!(matches!(
            parse_extraction("the bill is unreadable"),
            Err(ExtractionError::Malformed(_))
        ));
        // Missing province
        assert!(matches!(
            parse_extraction(r#"{"totalCost": 120, "totalConsumptionKwh": 300, "billingPeriodMonths": 2}"#),
            Err(ExtractionError::Malformed(_))
        ));
        assert!(matches!(
            parse_extraction(r#"{"totalCost": 120, "totalConsumptionKwh": 300, "billingPeriodMonths": -1, "province": "RM"}"#),
            Err(ExtractionError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_zero_consumption() {
        let result = parse_extraction(
            r#"{"totalCost": 120, "totalConsumptionKwh": 0, "billingPeriodMonths": 2, "province": "RM"}"#,
        );
        assert!(matches!(
            result,
            Err(ExtractionError::InvalidField(BillFieldError::NonPositiveConsumption(_)))
        ));
    }

    #[test]
    fn test_analyze_bill_propagates_service_failure() {
        let extractor = CannedExtractor(Err("quota exceeded"));
        let result = analyze_bill(&extractor, &request());
        assert!(matches!(result, Err(ExtractionError::Collaborator(_))));
    }

    #[test]
    fn test_analyze_bill_accepts_legacy_superset() {
        let extractor = CannedExtractor(Ok(r#"{
            "costo_totale": 120,
            "consumo_kwh": 300,
            "periodo_fatturazione_mesi": 2,
            "provincia_estratta": "RM",
            "costo_per_kwh": 0.4,
            "risparmio_mensile_eur": 1000
        }"#));
        let bill = analyze_bill(&extractor, &request()).unwrap();
        assert_eq!(bill.total_cost(), 120.0);
        assert_eq!(bill.billing_period_months(), 2);
    }

    #[test]
    fn test_document_validation() {
        assert!(matches!(
            BillDocument::new("text/plain", vec![1, 2, 3]),
            Err(ExtractionError::UnsupportedDocument(_))
        ));
        assert!(matches!(
            BillDocument::new("application/pdf", Vec::new()),
            Err(ExtractionError::EmptyDocument)
        ));
        assert_eq!(
            DocumentKind::from_path(Path::new("bill.JPG")),
            Some(DocumentKind::Jpeg)
        );
        assert_eq!(DocumentKind::from_path(Path::new("bill.txt")), None);
    }

    #[test]
    fn test_request_carries_kit_context() {
        let config = Configuration {
            battery: BatteryCapacity::Kwh5,
            panel: PanelArray::new(PanelType::Flexible, 8).unwrap(),
            ..Default::default()
        };
        let document = BillDocument::new("application/pdf", vec![b'%']).unwrap();
        let request = ExtractionRequest::new(document, &config);

        assert_eq!(request.kit.panel_peak_kw, 1.76);
        assert_eq!(request.kit.battery_kwh, 5.0);

        let instructions = request.instructions();
        assert!(instructions.contains("1.76 kWp"));
        assert!(instructions.contains("5 kWh battery"));
        assert!(instructions.contains("application/pdf"));
    }

    #[test]
    fn test_response_schema_lists_required_fields() {
        let schema = ExtractionRequest::response_schema().unwrap();
        let required = schema["required"].as_array().unwrap();
        for field in [
            "totalCost",
            "totalConsumptionKwh",
            "billingPeriodMonths",
            "province",
        ] {
            assert!(required.iter().any(|name| name == field), "missing {field}");
        }
    }
}
