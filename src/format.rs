//! Display formatting for numeric panel values.
//!
//! Values arrive from JSON and Prometheus as "maybe a number". Anything that
//! is not a finite number renders as [`UNAVAILABLE`]; nothing here panics.

/// Placeholder shown in place of a value that could not be obtained.
pub const UNAVAILABLE: &str = "--";

/// Format a nullable number for display (e.g. "1,234.57", "250", "--").
///
/// Finite values are rounded to at most two fractional digits, trailing zeros
/// are dropped and the integer part is grouped in thousands.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format_finite(v),
        _ => UNAVAILABLE.to_string(),
    }
}

/// Format a nullable number followed by a unit (e.g. "250 ms").
///
/// The unit is omitted when the value is unavailable.
pub fn format_with_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{} {}", format_finite(v), unit),
        _ => UNAVAILABLE.to_string(),
    }
}

fn format_finite(v: f64) -> String {
    let rounded = format!("{:.2}", v);
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };
    // -0.001 rounds to "-0.00"
    let sign = if frac.is_empty() && digits.bytes().all(|b| b == b'0') {
        ""
    } else {
        sign
    };

    let grouped = group_thousands(digits);
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
