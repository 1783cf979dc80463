//! Display rounding shared by every place a figure is shown to the user.
//!
//! The price per kWh is shown with three decimals; every other currency or
//! energy amount is shown as a whole number. Arithmetic always runs on the
//! unrounded values.

/// Rounds a price per kWh to three decimals.
pub fn round_unit_price(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Rounds a currency or energy amount to the nearest whole unit.
pub fn round_whole(value: f64) -> f64 {
    value.round()
}

/// Rounds a payback period to one decimal.
pub fn round_years(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
