/// Simple payback period in years: investment divided by yearly savings.
///
/// Returns `None` when there is nothing to pay back or no savings to pay it
/// back with; callers render that as "not applicable", never as zero.
pub fn payback_years(total_investment: f64, annual_savings: f64) -> Option<f64> {
    if total_investment > 0.0 && annual_savings > 0.0 {
        Some(total_investment / annual_savings)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payback_years() {
        assert_eq!(payback_years(2475.0, 720.0), Some(3.4375));
    }

    #[test]
    fn test_payback_not_applicable() {
        assert_eq!(payback_years(2475.0, 0.0), None);
        assert_eq!(payback_years(2475.0, -10.0), None);
        assert_eq!(payback_years(0.0, 720.0), None);
        assert_eq!(payback_years(2475.0, f64::NAN), None);
    }
}
