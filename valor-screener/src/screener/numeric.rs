//! PT-BR numeric parsing for screener exports.
//!
//! Cells arrive as `"R$ 1.234,56"`, `"12,5%"`, `"1.000"` or plain numbers.
//! The rule is always the Brazilian one: every `.` is a thousands separator
//! and the first `,` is the decimal point. A US-style `"1.5"` therefore
//! reads as `15`.

use super::types::CellValue;

/// Parse an optional cell into a number. Never fails: anything unreadable is `0`.
pub fn parse_numeric(value: Option<&CellValue>) -> f64 {
    match value {
        None => 0.0,
        Some(CellValue::Number(n)) => *n,
        Some(CellValue::Text(text)) => parse_locale_str(text),
    }
}

/// Parse a PT-BR formatted string.
pub fn parse_locale_str(raw: &str) -> f64 {
    let mut clean: String = raw.chars().filter(|c| !is_stripped(*c)).collect();
    clean.retain(|c| c != '.');

    if let Some(idx) = clean.find(',') {
        clean.replace_range(idx..idx + 1, ".");
    }

    parse_float_prefix(&clean).unwrap_or(0.0)
}

/// Currency marker characters, percent sign and whitespace.
fn is_stripped(c: char) -> bool {
    matches!(c, 'R' | '$' | '%' | '\u{feff}') || c.is_whitespace()
}

/// Parse the longest numeric prefix of `s`.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent; anything after the prefix is ignored. `Infinity` is
/// accepted after the sign. Returns `None` when no digit is found.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    let negative = bytes.first() == Some(&b'-');
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if digits > 0 || frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}
