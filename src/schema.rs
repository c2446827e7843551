use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Which physical meter a bill reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SourceType {
    Electric,
    Solar,
    Gas,
}

impl FromStr for SourceType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electric" | "electricity" | "grid" => Ok(SourceType::Electric),
            "solar" | "pv" => Ok(SourceType::Solar),
            "gas" | "natural-gas" | "natural_gas" => Ok(SourceType::Gas),
            other => Err(LedgerError::UnknownSourceType(other.to_string())),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Electric => write!(f, "electric"),
            SourceType::Solar => write!(f, "solar"),
            SourceType::Gas => write!(f, "gas"),
        }
    }
}

/// Fields recovered from an electric (grid) bill.
///
/// `imported_energy` and `exported_energy` are split from one signed net-usage
/// figure and are never both positive. `meter_production` comes from a separate
/// incentive-program section and is independent of net usage. `credit_balance`
/// is a rolling bank balance snapshot, not a per-period delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricFacts {
    pub imported_energy: f64,
    pub exported_energy: f64,
    pub meter_production: f64,
    pub credit_balance: f64,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarFacts {
    /// Inverter-reported production in kWh.
    pub production: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasFacts {
    pub therms_used: f64,
}

/// Source-specific facts, tagged so downstream code matches exhaustively
/// instead of probing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum BillFacts {
    Electric(ElectricFacts),
    Solar(SolarFacts),
    Gas(GasFacts),
}

impl BillFacts {
    pub fn source_type(&self) -> SourceType {
        match self {
            BillFacts::Electric(_) => SourceType::Electric,
            BillFacts::Solar(_) => SourceType::Solar,
            BillFacts::Gas(_) => SourceType::Gas,
        }
    }
}

/// One fully extracted bill. Immutable once built; cached verbatim keyed by
/// document id and reused across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    /// The bill's own date. Extraction fails outright when this is missing,
    /// so a record never exists without it.
    pub date: NaiveDate,
    /// Billed amount in dollars. Defaults to 0 when no cost figure matched.
    pub cost: f64,
    #[serde(flatten)]
    pub facts: BillFacts,
}

impl BillRecord {
    pub fn source_type(&self) -> SourceType {
        self.facts.source_type()
    }
}
