//! Field extraction for natural-gas bills.
//!
//! The simplest of the three formats: a statement date (sometimes with a
//! two-digit year), a total due, and the usage figure printed immediately
//! before the "Therms Billed Usage" label.

use chrono::NaiveDate;

use crate::error::{LedgerError, Result};
use crate::extract::patterns::{date_from_mdy, first_match, parse_energy, parse_money, CaptureBuilder};
use crate::schema::{BillFacts, BillRecord, GasFacts};

const STATEMENT_DATE: &[(&str, CaptureBuilder<NaiveDate>)] = &[(
    r"(?i)Statement Date\D*?(\d{1,2})/(\d{1,2})/(\d{2,4})",
    |caps| {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        date_from_mdy(month, day, year)
    },
)];

const COST: &[(&str, CaptureBuilder<f64>)] = &[(
    r"(?i)Total Amount Due[^\d-]*([\d,]+\.\d{2})",
    |caps| parse_money(&caps[1]).ok(),
)];

const THERMS_USED: &[(&str, CaptureBuilder<f64>)] = &[(
    r"(?i)([\d,]+)\s+Therms Billed Usage",
    |caps| parse_energy(&caps[1]).ok(),
)];

pub(crate) fn extract(text: &str) -> Result<BillRecord> {
    let date = first_match(text, STATEMENT_DATE)?.ok_or(LedgerError::MissingDate("gas"))?;

    let cost = first_match(text, COST)?.unwrap_or(0.0);
    let therms_used = first_match(text, THERMS_USED)?.unwrap_or(0.0);

    Ok(BillRecord {
        date,
        cost,
        facts: BillFacts::Gas(GasFacts { therms_used }),
    })
}
