use soleasy_model::bill::BillFieldError;
use thiserror::Error;

/// Hint shown to the user whenever a bill could not be analysed.
pub const RETRY_HINT: &str =
    "Analysis could not be completed, please retry with a clearer document.";

/// The bill could not be turned into trusted facts.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("the extraction service returned no data")]
    NoData,
    #[error("the extraction service returned malformed data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("the extracted bill failed validation: {0}")]
    InvalidField(#[from] BillFieldError),
    #[error("unsupported document type `{0}`, expected PNG, JPEG, WEBP or PDF")]
    UnsupportedDocument(String),
    #[error("the uploaded document is empty")]
    EmptyDocument,
    #[error("the extraction service failed: {0}")]
    Collaborator(String),
}

impl ExtractionError {
    /// Message to show the user; every extraction failure is worth a retry.
    pub fn user_message(&self) -> &'static str {
        RETRY_HINT
    }
}

/// An intermediate value of the projection is unusable.
///
/// A validated bill should never produce one of these, so seeing it means a
/// logic fault rather than bad input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("{quantity} is not a finite number ({value})")]
    NonFinite { quantity: &'static str, value: f64 },
    #[error("invariant violated: {detail}")]
    Invariant { detail: String },
}

/// Failure of a whole estimate run, from upload to report.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Computation(#[from] ComputationError),
}

impl EstimateError {
    /// Only extraction failures can be fixed by the user retrying with a better upload.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EstimateError::Extraction(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_extraction_errors_are_retryable() {
        let extraction = EstimateError::from(ExtractionError::NoData);
        assert!(extraction.is_retryable());

        let computation = EstimateError::from(ComputationError::NonFinite {
            quantity: "monthly production",
            value: f64::NAN,
        });
        assert!(!computation.is_retryable());
    }

    #[test]
    fn test_field_errors_keep_their_message() {
        let err = ExtractionError::from(BillFieldError::NonPositiveConsumption(0.0));
        assert_eq!(
            err.to_string(),
            "the extracted bill failed validation: total consumption must be a positive number of kWh, got 0"
        );
        assert_eq!(err.user_message(), RETRY_HINT);
    }
}
