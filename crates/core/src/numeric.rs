//! Numeric input normalisation.
//!
//! Every quantity or cost that arrives as free text (draft fields, imported
//! cells, manual registration forms) passes through here before it reaches
//! arithmetic. Nothing in this module panics or returns an error.

/// Tolerance for comparisons against zero. Quantities and money are tracked
/// as `f64` with no rounding until display.
pub const EPSILON: f64 = 1e-9;

/// Returns `value` when it is finite, else `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// True when `value` is within [`EPSILON`] of zero.
pub fn is_negligible(value: f64) -> bool {
    value.abs() <= EPSILON
}

/// Coerce arbitrary text into a finite number.
///
/// Everything except ASCII digits, `-` and `.` is stripped first, so
/// `"$1,250.50"` reads as `1250.5`. Blank input, input that strips down to
/// nothing, and anything that still does not parse yield `fallback`.
pub fn parse_numeric(raw: &str, fallback: f64) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return fallback;
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) => finite_or(value, fallback),
        Err(_) => fallback,
    }
}

/// Parse a sold/received adjustment: defaults to 0 and never goes negative.
pub fn parse_adjustment(raw: &str) -> f64 {
    let parsed = parse_numeric(raw, 0.0);
    if parsed > 0.0 { parsed } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_currency_and_grouping() {
        assert_eq!(parse_numeric("$1,250.50", 0.0), 1250.5);
        assert_eq!(parse_numeric(" 42 units ", 0.0), 42.0);
        assert_eq!(parse_numeric("-3", 0.0), -3.0);
    }

    #[test]
    fn blank_or_garbage_yields_fallback() {
        assert_eq!(parse_numeric("", 7.0), 7.0);
        assert_eq!(parse_numeric("   ", 7.0), 7.0);
        assert_eq!(parse_numeric("abc", 7.0), 7.0);
        assert_eq!(parse_numeric("1.2.3", 7.0), 7.0);
        assert_eq!(parse_numeric("--5", 7.0), 7.0);
    }

    #[test]
    fn adjustments_clamp_negative_to_zero() {
        assert_eq!(parse_adjustment("-12"), 0.0);
        assert_eq!(parse_adjustment(""), 0.0);
        assert_eq!(parse_adjustment("12.5"), 12.5);
    }

    proptest! {
        #[test]
        fn adjustment_is_always_finite_and_non_negative(raw in ".{0,24}") {
            let value = parse_adjustment(&raw);
            prop_assert!(value.is_finite());
            prop_assert!(value >= 0.0);
        }

        #[test]
        fn numeric_is_always_finite(raw in ".{0,24}", fallback in -1.0e6f64..1.0e6) {
            prop_assert!(parse_numeric(&raw, fallback).is_finite());
        }
    }
}
