//! Display helpers shared by the dashboard and the headless commands.

use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};

const MISSING: &str = "—";

/// Dollar amount with thousands separators, e.g. `$1,234.57`.
pub fn format_usd(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format_value(value);
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = match int_part.parse::<u128>() {
        Ok(n) => n.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}${}.{}", sign, grouped, frac),
        None => format!("{}${}", sign, grouped),
    }
}

pub fn format_opt_usd(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format_usd(v, decimals))
}

pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v),
        Some(v) => format_value(v),
        None => MISSING.to_string(),
    }
}

/// Signed 24h change, e.g. `+3.20%`.
pub fn format_change(value: f64) -> String {
    if !value.is_finite() {
        return format_value(value);
    }
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, value)
}

/// Raw rendering for values that can't be shown as fixed-point numbers.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        MISSING.to_string()
    } else {
        value.to_string()
    }
}

/// `Jan 5, 2026 · 14:03 UTC`. Unparseable stamps are shown as-is.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return MISSING.to_string(),
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%b %-d, %Y · %H:%M UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}
