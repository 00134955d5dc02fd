//! Best-effort conversions between keys and their textual form

use log::trace;

/// Parse `text` as an integer, falling back to zero.
///
/// Accepts decimal, `0x` prefixed hex, and float text (truncated toward zero).
pub fn int(text: &str) -> i64 {
    let trimmed = text.trim();
    parse_int(trimmed).unwrap_or_else(|| {
        trace!("Cannot convert {:?} to an integer, using 0", text);
        0
    })
}

/// Decimal representation of `value`.
pub fn string(value: i64) -> String {
    value.to_string()
}

fn parse_int(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16)
            .ok()
            .map(|value| if negative { value.wrapping_neg() } else { value });
    }

    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        // `as` saturates at the i64 bounds
        .map(|value| value.trunc() as i64)
}
