//! Textual forms of delivery dates and quantities.
//!
//! Dates travel as `DD.MM.YYYY.` (day first, trailing period). Quantities
//! arrive from forms and files with either a decimal point or a decimal
//! comma.

use chrono::NaiveDate;

/// `chrono` pattern for the external date form, e.g. `01.01.2099.`.
pub const DATE_FORMAT: &str = "%d.%m.%Y.";

/// Parse a delivery date in the fixed external pattern.
///
/// Surrounding whitespace is ignored. Anything else that deviates from the
/// pattern (missing trailing period, ISO order, ...) is rejected.
pub fn parse_delivery_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

pub fn format_delivery_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Parse a quantity in kilograms.
///
/// A decimal comma is normalised to a point first (`"12,5"` -> `12.5`).
/// Negative, NaN and infinite values are rejected.
pub fn parse_quantity(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let v: f64 = t.replace(',', ".").parse().ok()?;
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    Some(v)
}
