//! Field extraction for solar lease statements.
//!
//! The quirk here is the billing-period range: it prints only month and day
//! ("Oct 15 - Nov 14"), so the year has to be anchored from the due date,
//! which always carries a full year. A December cycle billed with a January
//! due date belongs to the earlier year.

use chrono::{Datelike, NaiveDate};

use crate::error::{LedgerError, Result};
use crate::extract::patterns::{
    date_from_mdy, first_match, month_from_name, parse_energy, parse_money, CaptureBuilder,
};
use crate::schema::{BillFacts, BillRecord, SolarFacts};

// End month/day of the "Billing Period" range. The year is absent by design.
const PERIOD_END: &[(&str, CaptureBuilder<(u32, u32)>)] = &[(
    r"(?i)Billing Period[^A-Za-z0-9]*[A-Za-z]+\s+\d{1,2}\s*[-\u{2013}]\s*([A-Za-z]+)\s+(\d{1,2})",
    |caps| {
        let month = month_from_name(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        Some((month, day))
    },
)];

const DUE_DATE: &[(&str, CaptureBuilder<NaiveDate>)] = &[(
    r"(?i)Due Date\D*?(\d{1,2})/(\d{1,2})/(\d{4})",
    |caps| {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        date_from_mdy(month, day, year)
    },
)];

const BILL_DATE: &[(&str, CaptureBuilder<NaiveDate>)] = &[(
    r"(?i)Bill Date\D*?(\d{1,2})/(\d{1,2})/(\d{2,4})",
    |caps| {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        date_from_mdy(month, day, year)
    },
)];

const COST: &[(&str, CaptureBuilder<f64>)] = &[
    (r"(?i)Total Due[^\d-]*([\d,]+\.\d{2})", |caps| {
        parse_money(&caps[1]).ok()
    }),
    // Flat lease statements only show the fixed monthly charge.
    (r"(?i)Monthly Charge[^\d-]*([\d,]+\.\d{2})", |caps| {
        parse_money(&caps[1]).ok()
    }),
];

const PRODUCTION: &[(&str, CaptureBuilder<f64>)] = &[(
    r"(?i)Electricity Produced\D*?([\d,]+)",
    |caps| parse_energy(&caps[1]).ok(),
)];

fn statement_date(text: &str) -> Result<Option<NaiveDate>> {
    let due_date = first_match(text, DUE_DATE)?;

    if let (Some((end_month, end_day)), Some(due)) = (first_match(text, PERIOD_END)?, due_date) {
        let year = if end_month == 12 && due.month() == 1 {
            due.year() - 1
        } else {
            due.year()
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, end_month, end_day) {
            return Ok(Some(date));
        }
    }

    if let Some(date) = first_match(text, BILL_DATE)? {
        return Ok(Some(date));
    }

    Ok(due_date)
}

pub(crate) fn extract(text: &str) -> Result<BillRecord> {
    let date = statement_date(text)?.ok_or(LedgerError::MissingDate("solar"))?;

    let cost = first_match(text, COST)?.unwrap_or(0.0);
    let production = first_match(text, PRODUCTION)?.unwrap_or(0.0);

    Ok(BillRecord {
        date,
        cost,
        facts: BillFacts::Solar(SolarFacts { production }),
    })
}
