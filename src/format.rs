//! Number formatting shared by the text serialisations.

/// Significant digits used unless configured otherwise.
pub const DEFAULT_PRECISION: usize = 5;

/// Formats `value` with `precision` significant digits as a plain decimal.
///
/// Exponent notation is never produced since neither PDF nor PostScript
/// accept it. Digits left of the decimal point are always kept, trailing
/// zeros are stripped and negative zero prints as `0`.
pub fn num(value: f64, precision: usize) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    let precision = precision.clamp(1, 15) as i32;
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (precision - 1 - magnitude).clamp(0, 15) as usize;
    let mut s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significant_digits() {
        assert_eq!(num(1.0, 5), "1");
        assert_eq!(num(0.5, 5), "0.5");
        assert_eq!(num(3.14159265, 5), "3.1416");
        assert_eq!(num(123.456789, 5), "123.46");
        assert_eq!(num(-0.000123456, 3), "-0.000123");
        assert_eq!(num(9.99996, 5), "10");
    }

    #[test]
    fn no_exponent_and_no_negative_zero() {
        assert_eq!(num(1e-20, 5), "0");
        assert_eq!(num(-1e-20, 5), "0");
        assert_eq!(num(123456789.0, 5), "123456789");
        assert_eq!(num(f64::NAN, 5), "0");
    }
}
