use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::error::ValidationErrors;

/// Digits after the decimal point an actual-hours value may carry.
pub const ACTUAL_HOURS_DECIMAL_PLACES: i64 = 2;

/// Upper bound shown in validation messages.
pub const ACTUAL_HOURS_MAX: &str = "9999.99";

pub fn actual_hours_max() -> BigDecimal {
    // 9999.99 as 999999 hundredths
    BigDecimal::new(999_999.into(), ACTUAL_HOURS_DECIMAL_PLACES)
}

pub fn zero_hours() -> BigDecimal {
    BigDecimal::from(0)
}

/// Parse a decimal hour amount such as `"7.5"` or `"12.25"`.
pub fn parse_hours(input: &str) -> Option<BigDecimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// Number of fractional digits once trailing zeros are ignored.
fn significant_decimal_places(value: &BigDecimal) -> i64 {
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    scale.max(0)
}

/// Check an actual-hours value against the column bounds, recording any
/// failure under `field`.
pub fn validate_actual_hours(field: &'static str, value: &BigDecimal, errors: &mut ValidationErrors) {
    if *value < zero_hours() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    }
    if *value > actual_hours_max() {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {}.", ACTUAL_HOURS_MAX),
        );
    }
    if significant_decimal_places(value) > ACTUAL_HOURS_DECIMAL_PLACES {
        errors.add(
            field,
            format!(
                "Ensure that there are no more than {} decimal places.",
                ACTUAL_HOURS_DECIMAL_PLACES
            ),
        );
    }
}

/// Check a logged increment: non-negative and at most two decimal places.
pub fn validate_increment(field: &'static str, value: &BigDecimal, errors: &mut ValidationErrors) {
    if *value < zero_hours() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    }
    if significant_decimal_places(value) > ACTUAL_HOURS_DECIMAL_PLACES {
        errors.add(
            field,
            format!(
                "Ensure that there are no more than {} decimal places.",
                ACTUAL_HOURS_DECIMAL_PLACES
            ),
        );
    }
}

/// Render with exactly two fractional digits, e.g. `35.00`.
pub fn format_hours(value: &BigDecimal) -> String {
    value.with_scale(ACTUAL_HOURS_DECIMAL_PLACES).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn errors_for(value: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validate_actual_hours("actual_design", &dec(value), &mut errors);
        errors
    }

    #[test]
    fn accepts_values_within_bounds() {
        for value in ["0", "0.5", "12.25", "9999.99", "1.500"] {
            assert!(errors_for(value).is_empty(), "{} should be valid", value);
        }
    }

    #[test]
    fn rejects_values_above_maximum() {
        let errors = errors_for("10000.00");
        assert_eq!(
            errors.get("actual_design").unwrap(),
            ["Ensure this value is less than or equal to 9999.99."]
        );
    }

    #[test]
    fn rejects_negative_values() {
        let errors = errors_for("-0.01");
        assert_eq!(
            errors.get("actual_design").unwrap(),
            ["Ensure this value is greater than or equal to 0."]
        );
    }

    #[test]
    fn rejects_three_decimal_places() {
        let errors = errors_for("1.005");
        assert_eq!(
            errors.get("actual_design").unwrap(),
            ["Ensure that there are no more than 2 decimal places."]
        );
    }

    #[test]
    fn tiny_exponent_is_rejected_without_expanding_it() {
        let mut errors = ValidationErrors::new();
        validate_increment("actual_design", &dec("1e-20000"), &mut errors);
        assert_eq!(
            errors.get("actual_design").unwrap(),
            ["Ensure that there are no more than 2 decimal places."]
        );
    }

    #[test]
    fn large_exponent_counts_no_decimal_places() {
        assert_eq!(significant_decimal_places(&dec("1e3")), 0);
        assert_eq!(significant_decimal_places(&dec("12.50")), 1);
        assert_eq!(significant_decimal_places(&dec("0")), 0);
    }

    #[test]
    fn increments_must_be_non_negative() {
        let mut errors = ValidationErrors::new();
        validate_increment("actual_testing", &dec("-1"), &mut errors);
        assert!(errors.has("actual_testing"));

        let mut errors = ValidationErrors::new();
        validate_increment("actual_testing", &dec("3.75"), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn parses_and_formats_hours() {
        assert_eq!(parse_hours(" 7.5 "), Some(dec("7.5")));
        assert_eq!(parse_hours(""), None);
        assert_eq!(parse_hours("seven"), None);
        assert_eq!(format_hours(&dec("35")), "35.00");
        assert_eq!(format_hours(&dec("0.5")), "0.50");
    }
}
