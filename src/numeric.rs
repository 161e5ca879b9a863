//! Numeric coercion and clamping.
//!
//! Rule sources are untrusted JSON, so every number that reaches a
//! modifier goes through the loose coercion here first. Coercion never
//! fails: anything that is not a usable number becomes `0.0`.

use crate::error::RuleError;
use serde_json::Value;

/// Coerce a JSON value to a number, falling back to `0.0`.
///
/// Numbers pass through, numeric strings are parsed after trimming,
/// booleans become `1.0`/`0.0`, and everything else (including NaN)
/// becomes `0.0`.
///
/// # Examples
///
/// ```rust
/// use zzmod::numeric::coerce_number;
/// use serde_json::json;
///
/// assert_eq!(coerce_number(&json!(3)), 3.0);
/// assert_eq!(coerce_number(&json!(" -2.5 ")), -2.5);
/// assert_eq!(coerce_number(&json!(true)), 1.0);
/// assert_eq!(coerce_number(&json!("abc")), 0.0);
/// assert_eq!(coerce_number(&json!(null)), 0.0);
/// ```
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_number(s).unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// Parse a declared bound.
///
/// Returns `Ok(None)` when the bound is absent or `null`, `Ok(Some(n))`
/// for numbers and numeric strings, and `RuleError::InvalidBound` naming
/// `field` for anything else.
pub fn parse_bound(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<f64>, RuleError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_number(s),
        Some(_) => None,
    };
    parsed.map(Some).ok_or(RuleError::InvalidBound(field))
}

/// Loose truthiness for untrusted flags.
///
/// `null`, `false`, `0`, NaN and `""` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Clamp a value to the bounds that were actually declared.
///
/// The lower bound is applied first, then the upper bound, so an
/// undeclared side leaves the value alone and `min > max` resolves to
/// `max` instead of panicking.
///
/// # Examples
///
/// ```rust
/// use zzmod::numeric::clamp_declared;
///
/// assert_eq!(clamp_declared(5.0, Some(0.0), Some(3.0)), 3.0);
/// assert_eq!(clamp_declared(-2.0, Some(0.0), None), 0.0);
/// assert_eq!(clamp_declared(7.0, Some(0.0), None), 7.0);
/// assert_eq!(clamp_declared(7.0, None, None), 7.0);
/// ```
pub fn clamp_declared(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut result = value;
    if let Some(min) = min {
        result = result.max(min);
    }
    if let Some(max) = max {
        result = result.min(max);
    }
    result
}

/// Parse a string the way JavaScript's `Number()` does.
///
/// Accepts decimal literals with an optional sign and exponent,
/// `Infinity`, and unsigned `0x`/`0o`/`0b` integers. Whitespace around
/// the literal is ignored and an empty string is zero.
fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .ok()
            .map(|n| n as f64);
    }

    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    // Rust also accepts "inf" and "nan"; JavaScript does not.
    let decimal = unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal {
        return None;
    }
    unsigned.parse::<f64>().ok().map(|n| sign * n)
}
