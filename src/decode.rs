//! Decoders for the numeric encodings used in TLE columns.
//!
//! Malformed digits never raise an error here: integers decode to `None`
//! and floats to NaN, and `is_valid_tle` is responsible for flagging the
//! record.

use serde::Serialize;

use crate::fields::FieldKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(Option<i64>),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value; NaN for text or undecodable integers.
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Int(Some(v)) => *v as f64,
            FieldValue::Int(None) => f64::NAN,
            FieldValue::Float(v) => *v,
            FieldValue::Text(_) => f64::NAN,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => *v,
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub fn decode(raw: &str, kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Int => FieldValue::Int(decode_int(raw)),
        FieldKind::Float => FieldValue::Float(decode_float(raw)),
        FieldKind::Char => FieldValue::Text(raw.trim().to_string()),
        FieldKind::DecimalAssumed => FieldValue::Float(decode_decimal_assumed(raw)),
        FieldKind::DecimalAssumedE => FieldValue::Float(decode_decimal_assumed_e(raw)),
    }
}

pub fn decode_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub fn decode_float(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// `"0006317"` -> `0.0006317`.
pub fn decode_decimal_assumed(raw: &str) -> f64 {
    decode_float(&format!("0.{}", raw.trim()))
}

/// `"36771-4"` -> `0.36771e-4`, rounded to 5 significant figures.
pub fn decode_decimal_assumed_e(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.len() < 3 || !raw.is_char_boundary(raw.len() - 2) {
        return f64::NAN;
    }
    let (mantissa, exponent) = raw.split_at(raw.len() - 2);

    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    let Ok(exponent) = exponent.parse::<i32>() else {
        return f64::NAN;
    };

    let magnitude = decode_float(&format!("0.{digits}"));
    let value = magnitude * 10f64.powi(exponent);
    round_significant(if negative { -value } else { value }, 5)
}

fn round_significant(value: f64, digits: usize) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    format!("{:.*e}", digits.saturating_sub(1), value)
        .parse()
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn decimal_assumed_e_positive_exponent_forms() {
        assert_relative_eq!(decode_decimal_assumed_e("36771-4"), 0.000036771, max_relative = 1e-12);
        assert_relative_eq!(decode_decimal_assumed_e("13004-3"), 0.00013004, max_relative = 1e-12);
        assert_relative_eq!(decode_decimal_assumed_e("12340-4"), 0.00001234, max_relative = 1e-12);
    }

    #[test]
    fn decimal_assumed_e_zero() {
        assert_eq!(decode_decimal_assumed_e("00000-0"), 0.0);
        assert_eq!(decode_decimal_assumed_e("00000+0"), 0.0);
        assert_eq!(decode_decimal_assumed_e(" 00000-0"), 0.0);
    }

    #[test]
    fn decimal_assumed_e_negative_mantissa_ignores_sign_when_placing_point() {
        assert_relative_eq!(decode_decimal_assumed_e("-11606-4"), -0.000011606, max_relative = 1e-12);
        assert_relative_eq!(decode_decimal_assumed_e("-29896-5"), -0.0000029896, max_relative = 1e-12);
    }

    #[test]
    fn decimal_assumed_e_garbage_is_nan() {
        assert!(decode_decimal_assumed_e("abcde-4").is_nan());
        assert!(decode_decimal_assumed_e("1").is_nan());
    }

    #[test]
    fn decimal_assumed_prepends_leading_zero() {
        assert_relative_eq!(decode_decimal_assumed("0006317"), 0.0006317);
        assert_relative_eq!(decode_decimal_assumed("0000884"), 0.0000884);
    }

    #[test]
    fn int_and_float_fail_softly() {
        assert_eq!(decode_int("25544"), Some(25544));
        assert_eq!(decode_int(" 17"), Some(17));
        assert_eq!(decode_int("2A544"), None);
        assert!(decode_float("x.5").is_nan());
        assert_relative_eq!(decode_float(" .00001961"), 0.00001961);
        assert_relative_eq!(decode_float("-.00002182"), -0.00002182);
    }

    #[test]
    fn char_is_trimmed_text() {
        assert_eq!(decode("A  ", FieldKind::Char), FieldValue::Text("A".into()));
    }
}
