//! Token lifetime strings such as `"15m"` or `"7d"`.
//!
//! Format: an unsigned integer followed by an optional unit. Recognised
//! units are `ms`, `s`, `m`, `h`, `d` and `w`. A bare integer is read as
//! milliseconds. The result is whole seconds, rounded down.

use crate::error::CoreError;

/// Parse a lifetime string into whole seconds.
///
/// ```
/// use civic_core::expiry::parse_expiry_secs;
///
/// assert_eq!(parse_expiry_secs("15m").unwrap(), 900);
/// assert_eq!(parse_expiry_secs("7d").unwrap(), 604_800);
/// ```
pub fn parse_expiry_secs(input: &str) -> Result<i64, CoreError> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(CoreError::Validation(format!(
            "Invalid expiry '{input}': expected a number followed by ms, s, m, h, d or w"
        )));
    }

    let value: i64 = digits
        .parse()
        .map_err(|_| CoreError::Validation(format!("Invalid expiry '{input}': number too large")))?;

    let millis_per_unit: i64 = match unit.trim() {
        "" | "ms" => 1,
        "s" => 1_000,
        "m" => 60 * 1_000,
        "h" => 60 * 60 * 1_000,
        "d" => 24 * 60 * 60 * 1_000,
        "w" => 7 * 24 * 60 * 60 * 1_000,
        other => {
            return Err(CoreError::Validation(format!(
                "Invalid expiry '{input}': unknown unit '{other}'"
            )))
        }
    };

    let millis = value
        .checked_mul(millis_per_unit)
        .ok_or_else(|| CoreError::Validation(format!("Invalid expiry '{input}': overflow")))?;

    let secs = millis / 1_000;
    if secs <= 0 {
        return Err(CoreError::Validation(format!(
            "Invalid expiry '{input}': must be at least one second"
        )));
    }
    Ok(secs)
}
