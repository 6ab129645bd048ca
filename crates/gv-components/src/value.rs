//! Engineering-suffix value parsing and formatting.
//!
//! Script files write component values the way they are spoken: `4.7k`,
//! `100n`, `2.2M`. Suffixes are single characters appended to a decimal
//! number; `u` is micro.

use crate::error::{ComponentError, ComponentResult};
use gv_core::Real;

const SUFFIXES: [(char, i32); 7] = [
    ('p', -12),
    ('n', -9),
    ('u', -6),
    ('m', -3),
    ('k', 3),
    ('M', 6),
    ('G', 9),
];

/// Parse a value string with an optional engineering suffix.
///
/// The suffix is spliced in as a decimal exponent before the float parse, so
/// `100n` yields exactly the same value as the literal `100e-9`; multiplying
/// a parsed mantissa by a scale factor would be off by an ulp.
pub fn parse_value(text: &str) -> ComponentResult<Real> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ComponentError::InvalidValue {
            text: text.to_string(),
        });
    }

    let parsed: Result<Real, _> = match text.chars().last().and_then(suffix_exponent) {
        Some(exp) => format!("{}e{exp}", &text[..text.len() - 1]).parse(),
        None => text.parse(),
    };
    let value = parsed.map_err(|_| ComponentError::InvalidValue {
        text: text.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ComponentError::InvalidValue {
            text: text.to_string(),
        });
    }
    Ok(value)
}

/// Format a value with the largest suffix that keeps the mantissa in
/// [1, 1000). Values of exactly zero print as `0`.
pub fn format_value(v: Real) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    for &(suffix, exp) in SUFFIXES.iter().rev() {
        let scale = 10f64.powi(exp);
        if magnitude >= scale && exp > 0 {
            return format!("{}{}", trim_mantissa(v / scale), suffix);
        }
    }
    if magnitude >= 1.0 {
        return trim_mantissa(v);
    }
    for &(suffix, exp) in SUFFIXES.iter() {
        let scale = 10f64.powi(exp);
        if magnitude < scale * 1e3 {
            return format!("{}{}", trim_mantissa(v / scale), suffix);
        }
    }
    trim_mantissa(v)
}

/// Print with enough digits to round-trip typical component values, without
/// trailing zeros.
fn trim_mantissa(v: Real) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

fn suffix_exponent(c: char) -> Option<i32> {
    SUFFIXES
        .iter()
        .find(|(suffix, _)| *suffix == c)
        .map(|(_, exp)| *exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_plain_and_suffixed() {
        assert_eq!(parse_value("12").unwrap(), 12.0);
        assert_eq!(parse_value("4.7k").unwrap(), 4_700.0);
        assert_eq!(parse_value("100n").unwrap(), 100e-9);
        assert_eq!(parse_value("2.2M").unwrap(), 2.2e6);
        assert_eq!(parse_value("10u").unwrap(), 10e-6);
        assert_eq!(parse_value("-5m").unwrap(), -5e-3);
    }

    #[test]
    fn suffixed_parse_is_bit_exact() {
        // Equal to the literal, not merely close
        assert_eq!(parse_value("100n").unwrap(), 1e-7);
        assert_eq!(parse_value("1u").unwrap(), 1e-6);
        assert_eq!(parse_value("4.7k").unwrap(), 4.7e3);
        assert_eq!(parse_value("3.3p").unwrap(), 3.3e-12);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_value("").is_err());
        assert!(parse_value("k").is_err());
        assert!(parse_value("1.2.3").is_err());
        assert!(parse_value("12q").is_err());
    }

    #[test]
    fn format_picks_suffix() {
        assert_eq!(format_value(4_700.0), "4.7k");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(1e-7), "100n");
        assert_eq!(format_value(2.2e6), "2.2M");
    }

    proptest! {
        #[test]
        fn format_parse_round_trips(exp in -10i32..9, mant in 1.0f64..999.0) {
            let v = mant * 10f64.powi(exp);
            let parsed = parse_value(&format_value(v)).unwrap();
            prop_assert!((parsed - v).abs() <= v.abs() * 1e-5);
        }
    }
}
