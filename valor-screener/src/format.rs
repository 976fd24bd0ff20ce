//! PT-BR display formatting for prices, volumes and ratios.

/// Compact scale suffixes, largest first.
const COMPACT_UNITS: &[(f64, &str)] = &[
    (1e12, "tri"),
    (1e9, "bi"),
    (1e6, "mi"),
    (1e3, "mil"),
];

/// Format as Brazilian currency: `R$ 1.234,56`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("R$ {}", value);
    }
    let sign = if value < 0.0 && value.abs() >= 0.005 { "-" } else { "" };
    format!("{}R$ {}", sign, localize(value.abs(), 2, false))
}

/// Format as compact Brazilian currency: `R$ 1,5 mi`, `R$ 320 mil`.
pub fn format_compact_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("R$ {}", value);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    for (scale, unit) in COMPACT_UNITS {
        // 999_950 reads "1 mi" rather than "1.000 mil".
        if abs >= scale * 0.99995 {
            return format!("{}R$ {} {}", sign, localize(abs / scale, 1, true), unit);
        }
    }

    format!("{}R$ {}", sign, localize(abs, 1, true))
}

/// Format a value already expressed in percent: `12.50%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Format a plain number with PT-BR grouping and at most two decimals.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 && value.abs() >= 0.005 { "-" } else { "" };
    format!("{}{}", sign, localize(value.abs(), 2, true))
}

/// Render a non-negative value with `.` grouping and `,` decimals.
fn localize(value: f64, decimals: usize, trim_zeros: bool) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (fixed.as_str(), ""),
    };

    let frac = if trim_zeros {
        frac_part.trim_end_matches('0')
    } else {
        frac_part
    };

    let grouped = group_thousands(int_part);
    if frac.is_empty() {
        grouped
    } else {
        format!("{},{}", grouped, frac)
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}
