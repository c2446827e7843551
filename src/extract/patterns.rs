//! Shared pattern-matching machinery for the per-vendor extractors.
//!
//! Each bill field is described by an ordered list of (pattern, builder)
//! candidates. Candidates are tried in priority order and the first one whose
//! builder produces a value wins; a regex hit whose captured number fails to
//! parse does not count as a match and the next candidate is attempted.

use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::error::{LedgerError, Result};
use crate::utils::normalize_year;

pub(crate) type CaptureBuilder<T> = fn(&Captures) -> Option<T>;

/// Evaluates field candidates in priority order. `Ok(None)` means no candidate
/// matched; the caller decides whether that is a default or a hard failure.
pub(crate) fn first_match<T>(
    text: &str,
    candidates: &[(&str, CaptureBuilder<T>)],
) -> Result<Option<T>> {
    for (pattern, build) in candidates {
        let re = Regex::new(pattern)?;
        if let Some(caps) = re.captures(text) {
            if let Some(value) = build(&caps) {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

/// Parses a currency figure: exactly two fractional digits, optional
/// thousands separators, no sign.
pub fn parse_money(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().replace(',', "");
    cleaned
        .parse::<f64>()
        .map_err(|_| LedgerError::MalformedNumeric(raw.to_string()))
}

/// Parses an energy figure: signed integer with optional thousands separators.
pub fn parse_energy(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().replace(',', "");
    cleaned
        .parse::<i64>()
        .map(|v| v as f64)
        .map_err(|_| LedgerError::MalformedNumeric(raw.to_string()))
}

/// "Nov" / "November" (any case) to a 1-based month number.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    match prefix {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// "November 14, 2023" or "Nov 14, 2023".
pub fn parse_human_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }
    let month = month_from_name(parts[0])?;
    let day: u32 = parts[1].trim_end_matches(',').parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Builds a date from MM/DD/(YY)YY components.
pub fn date_from_mdy(month: u32, day: u32, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(normalize_year(year), month, day)
}
