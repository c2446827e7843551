//! Field extraction for grid-utility electric bills.
//!
//! These statements carry the richest set of facts: the service period, a
//! signed net-usage figure under Delivery Services, an independent
//! meter-production figure inside the renewable-incentive section, and a
//! rolling credit bank. Pattern order per field tracks observed layout drift
//! across bill revisions.

use chrono::NaiveDate;

use crate::error::{LedgerError, Result};
use crate::extract::patterns::{
    first_match, parse_energy, parse_human_date, parse_money, CaptureBuilder,
};
use crate::schema::{BillFacts, BillRecord, ElectricFacts};

type PeriodMatch = (NaiveDate, Option<(NaiveDate, NaiveDate)>);

const BILLING_PERIOD: &[(&str, CaptureBuilder<PeriodMatch>)] = &[
    // Preferred: the full "«start» to «end»" service range; the bill is dated
    // by the end of its cycle.
    (
        r"(?i)([A-Za-z]+ \d{1,2}, \d{4})\s+to\s+([A-Za-z]+ \d{1,2}, \d{4})",
        |caps| {
            let start = parse_human_date(&caps[1])?;
            let end = parse_human_date(&caps[2])?;
            Some((end, Some((start, end))))
        },
    ),
    // Some revisions print only the cycle end date. No period bounds then.
    (r"(?i)to\s+([A-Za-z]+ \d{1,2}, \d{4})", |caps| {
        parse_human_date(&caps[1]).map(|end| (end, None))
    }),
];

const COST: &[(&str, CaptureBuilder<f64>)] = &[
    // The charge delta for this cycle, when broken out.
    (r"(?i)Current Charges[^\d-]*([\d,]+\.\d{2})", |caps| {
        parse_money(&caps[1]).ok()
    }),
    (r"(?i)Total Amount Due[^\d-]*([\d,]+\.\d{2})", |caps| {
        parse_money(&caps[1]).ok()
    }),
];

// Net usage lives under Delivery Services; the same label appears in other
// sections with different meanings, so the match is anchored to the section
// heading. Negative usage means the site exported to the grid.
const NET_USAGE: &[(&str, CaptureBuilder<f64>)] = &[(
    r"(?is)Delivery Services.*?Total Usage\s*:?\s*(-?[\d,]+)",
    |caps| parse_energy(&caps[1]).ok(),
)];

// Meter-reported generation inside the incentive-program section,
// independent of the net-usage figure.
const METER_PRODUCTION: &[(&str, CaptureBuilder<f64>)] = &[(
    r"(?is)Residential Renewable Energy.*?Energy\s*:?\s*(-?[\d,]+)\s*kWh",
    |caps| parse_energy(&caps[1]).ok(),
)];

// Printed as a negative currency amount ("-$96.12" or "$-96.12"); the ledger
// stores the magnitude of the bank balance.
const CREDIT_BALANCE: &[(&str, CaptureBuilder<f64>)] = &[(
    r"(?i)Credit Balance\D*?(?:-\s*\$|\$\s*-)\s*([\d,]+\.\d{2})",
    |caps| parse_money(&caps[1]).ok(),
)];

pub(crate) fn extract(text: &str) -> Result<BillRecord> {
    let (date, period) =
        first_match(text, BILLING_PERIOD)?.ok_or(LedgerError::MissingDate("electric"))?;

    let cost = first_match(text, COST)?.unwrap_or(0.0);
    let net_usage = first_match(text, NET_USAGE)?.unwrap_or(0.0);
    let meter_production = first_match(text, METER_PRODUCTION)?.unwrap_or(0.0).abs();
    let credit_balance = first_match(text, CREDIT_BALANCE)?.unwrap_or(0.0);

    let (imported_energy, exported_energy) = if net_usage >= 0.0 {
        (net_usage, 0.0)
    } else {
        (0.0, -net_usage)
    };

    let (period_start, period_end) = match period {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };

    Ok(BillRecord {
        date,
        cost,
        facts: BillFacts::Electric(ElectricFacts {
            imported_energy,
            exported_energy,
            meter_production,
            credit_balance,
            period_start,
            period_end,
        }),
    })
}
