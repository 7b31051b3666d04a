//! Result formatting.
//!
//! Numbers use the shortest digit string that parses back to the same value.
//! Magnitudes from `1e-4` up to (but excluding) `1e16` are written out in
//! decimal, everything else in exponential form with a signed, two-digit
//! minimum exponent: `1e+16`, `2.5e-07`.

use super::error::EvalError;

const MIN_DECIMAL_EXPONENT: i32 = -4;
const MAX_DECIMAL_EXPONENT: i32 = 16;

/// Format an evaluation result for display.
///
/// Fails with [`EvalError::NonFiniteResult`] for NaN and infinities.
pub fn format_number(value: f64) -> Result<String, EvalError> {
    if !value.is_finite() {
        return Err(EvalError::NonFiniteResult);
    }
    if value == 0.0 {
        // Also folds negative zero.
        return Ok("0".to_string());
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .and_then(|(m, e)| Some((m, e.parse::<i32>().ok()?)))
        .unwrap_or((scientific.as_str(), 0));

    if (MIN_DECIMAL_EXPONENT..MAX_DECIMAL_EXPONENT).contains(&exponent) {
        return Ok(format!("{}", value));
    }

    let sign = if exponent < 0 { '-' } else { '+' };
    Ok(format!("{}e{}{:02}", mantissa, sign, exponent.abs()))
}
