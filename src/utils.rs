use chrono::{Datelike, Days, NaiveDate};

use crate::error::{LedgerError, Result};

/// Bills dated on or before this day-of-month are attributed to the prior
/// calendar month. Vendors issue statements a couple of weeks after the
/// period they cover, so an early-to-mid-month bill reports last month's
/// usage. Tuned to the observed billing cadence, not a general truth.
pub const BILLING_LAG_DAY_CUTOFF: u32 = 20;

/// The `YYYY-MM` ledger key for a bill date, after the billing-lag shift.
/// Lexical order of these keys matches chronological order.
pub fn billing_month_key(date: NaiveDate) -> String {
    let (year, month) = if date.day() <= BILLING_LAG_DAY_CUTOFF {
        prev_month(date.year(), date.month())
    } else {
        (date.year(), date.month())
    };
    format!("{:04}-{:02}", year, month)
}

pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// Parses a ledger key back into (year, month).
pub fn parse_month_key(key: &str) -> Result<(i32, u32)> {
    let (year_str, month_str) = key
        .split_once('-')
        .ok_or_else(|| LedgerError::DateError(format!("Invalid month key: {}", key)))?;

    let year: i32 = year_str
        .parse()
        .map_err(|_| LedgerError::DateError(format!("Invalid year in month key: {}", key)))?;
    let month: u32 = month_str
        .parse()
        .map_err(|_| LedgerError::DateError(format!("Invalid month in month key: {}", key)))?;

    if !(1..=12).contains(&month) {
        return Err(LedgerError::DateError(format!(
            "Month out of range in key: {}",
            key
        )));
    }

    Ok((year, month))
}

/// 2-digit statement years are taken as 2000+.
pub fn normalize_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}
