//! Best-effort conversion of decoded JSON values into record fields.

use serde_json::Value;

/// Text value of a field: non-blank strings (trimmed) and numbers.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer value of a field, truncated toward zero.
///
/// Strings are read like a lenient integer parse: leading whitespace, an
/// optional sign and the leading run of digits, so `"2 times"` is `2` and
/// `"3.7"` is `3`.
pub fn count(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).ok()
            } else if n.is_i64() {
                None
            } else {
                n.as_f64().and_then(truncate_float)
            }
        }
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "range checked before the cast"
)]
fn truncate_float(f: f64) -> Option<u32> {
    let truncated = f.trunc();
    (truncated.is_finite() && truncated >= 0.0 && truncated <= f64::from(u32::MAX))
        .then_some(truncated as u32)
}

fn leading_integer(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let parsed = rest[..digits_len].parse::<u32>().ok()?;
    if negative && parsed != 0 {
        return None;
    }
    Some(parsed)
}
