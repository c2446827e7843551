use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::schema::{BillFacts, BillRecord};
use crate::utils::{billing_month_key, last_day_of_month, parse_month_key};

/// Energy content of one therm of natural gas, in kWh.
pub const KWH_PER_THERM: f64 = 29.3;

/// Daily solar production keyed by date, in kWh. Injected wholesale before
/// metrics run; when present it overrides both bill-derived production
/// figures.
pub type DailyProduction = BTreeMap<NaiveDate, f64>;

/// Per-month accumulator. The first block of fields is summed across every
/// record assigned to the month; the second block is last-write-wins, so
/// input order (oldest to newest) decides which electric record sticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    // Summed per record.
    pub electric_cost: f64,
    pub imported_energy: f64,
    pub exported_energy: f64,
    pub meter_production: f64,
    pub solar_cost: f64,
    pub inverter_production: f64,
    pub gas_cost: f64,
    pub therms_used: f64,

    // Overwritten per record, never summed. The credit balance is a rolling
    // bank snapshot and only positive readings replace it.
    pub credit_balance: f64,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// One month of the reconciled ledger: the raw bucket totals plus the derived
/// cross-source metrics. Computed fresh on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// `YYYY-MM` ledger key.
    pub month: String,
    pub bucket: MonthlyBucket,
    /// Best available production figure: daily series, else bill meter,
    /// else inverter.
    pub total_production: f64,
    /// Production consumed on site rather than exported. Clamped at zero.
    pub self_use: f64,
    /// Self-use plus grid import: the site's actual demand.
    pub true_consumption: f64,
    /// Production minus true consumption.
    pub net_position: f64,
    /// Electric plus solar cost.
    pub total_cost: f64,
    /// Blended $/kWh over true consumption; zero when nothing was consumed.
    pub effective_rate: f64,
    pub gas_energy_equivalent: f64,
    pub total_energy_cost: f64,
    pub total_energy_equivalent: f64,
}

/// Buckets normalized bill records into calendar months and derives the
/// cross-source metrics. One instance owns one reconciliation pass: created
/// empty, fed by `add_record`, read out once through `monthly_summaries`.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    buckets: BTreeMap<String, MonthlyBucket>,
    daily_production: Option<DailyProduction>,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into its month bucket. The bucket key is fixed here,
    /// at insertion, and never recomputed.
    pub fn add_record(&mut self, record: &BillRecord) {
        let key = billing_month_key(record.date);
        let bucket = self.buckets.entry(key.clone()).or_default();

        match &record.facts {
            BillFacts::Electric(facts) => {
                bucket.electric_cost += record.cost;
                bucket.imported_energy += facts.imported_energy;
                bucket.exported_energy += facts.exported_energy;
                bucket.meter_production += facts.meter_production;

                if facts.credit_balance > 0.0 {
                    bucket.credit_balance = facts.credit_balance;
                }
                if facts.period_start.is_some() {
                    bucket.period_start = facts.period_start;
                }
                if facts.period_end.is_some() {
                    bucket.period_end = facts.period_end;
                }
            }
            BillFacts::Solar(facts) => {
                bucket.solar_cost += record.cost;
                bucket.inverter_production += facts.production;
            }
            BillFacts::Gas(facts) => {
                bucket.gas_cost += record.cost;
                bucket.therms_used += facts.therms_used;
            }
        }

        debug!(
            "Bucketed {} bill dated {} into {}",
            record.source_type(),
            record.date,
            key
        );
    }

    /// Installs the externally sourced daily-production series. Call at most
    /// once, before reading summaries.
    pub fn set_daily_production(&mut self, series: DailyProduction) {
        self.daily_production = Some(series);
    }

    /// Derives the monthly summaries, ascending by month key.
    pub fn monthly_summaries(&self) -> Vec<MonthlySummary> {
        self.buckets
            .iter()
            .map(|(key, bucket)| self.summarize(key, bucket))
            .collect()
    }

    fn summarize(&self, key: &str, bucket: &MonthlyBucket) -> MonthlySummary {
        let total_production = self.resolve_total_production(key, bucket);

        let self_use = (total_production - bucket.exported_energy).max(0.0);
        let true_consumption = self_use + bucket.imported_energy;
        let net_position = total_production - true_consumption;
        let total_cost = bucket.electric_cost + bucket.solar_cost;
        let effective_rate = if true_consumption > 0.0 {
            total_cost / true_consumption
        } else {
            0.0
        };
        let gas_energy_equivalent = bucket.therms_used * KWH_PER_THERM;
        let total_energy_cost = total_cost + bucket.gas_cost;
        let total_energy_equivalent = true_consumption + gas_energy_equivalent;

        MonthlySummary {
            month: key.to_string(),
            bucket: bucket.clone(),
            total_production,
            self_use,
            true_consumption,
            net_position,
            total_cost,
            effective_rate,
            gas_energy_equivalent,
            total_energy_cost,
            total_energy_equivalent,
        }
    }

    /// Production source priority: the metered daily series when it covers
    /// the month, then the bill's own meter figure, then the inverter total.
    fn resolve_total_production(&self, key: &str, bucket: &MonthlyBucket) -> f64 {
        if let Some(series) = &self.daily_production {
            let daily_sum = match (bucket.period_start, bucket.period_end) {
                (Some(start), Some(end)) => {
                    // Daily meter readings post one day behind the billing
                    // cycle's accounting convention, hence the back-shift.
                    let window_start = start - Days::new(1);
                    let window_end = end - Days::new(1);
                    let sum: f64 = series.range(window_start..=window_end).map(|(_, v)| v).sum();
                    sum.round()
                }
                _ => match parse_month_key(key) {
                    Ok((year, month)) => {
                        let first = NaiveDate::from_ymd_opt(year, month, 1);
                        match first {
                            Some(first) => {
                                let last = last_day_of_month(year, month);
                                series.range(first..=last).map(|(_, v)| v).sum()
                            }
                            None => 0.0,
                        }
                    }
                    Err(_) => 0.0,
                },
            };

            if daily_sum > 0.0 {
                return daily_sum;
            }
        }

        if bucket.meter_production > 0.0 {
            bucket.meter_production
        } else {
            bucket.inverter_production
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ElectricFacts, GasFacts, SolarFacts};

    fn electric_record(date: &str, cost: f64, net_usage: f64) -> BillRecord {
        let (imported, exported) = if net_usage >= 0.0 {
            (net_usage, 0.0)
        } else {
            (0.0, -net_usage)
        };
        BillRecord {
            date: date.parse().unwrap(),
            cost,
            facts: BillFacts::Electric(ElectricFacts {
                imported_energy: imported,
                exported_energy: exported,
                meter_production: 0.0,
                credit_balance: 0.0,
                period_start: None,
                period_end: None,
            }),
        }
    }

    fn solar_record(date: &str, cost: f64, production: f64) -> BillRecord {
        BillRecord {
            date: date.parse().unwrap(),
            cost,
            facts: BillFacts::Solar(SolarFacts { production }),
        }
    }

    fn gas_record(date: &str, cost: f64, therms: f64) -> BillRecord {
        BillRecord {
            date: date.parse().unwrap(),
            cost,
            facts: BillFacts::Gas(GasFacts { therms_used: therms }),
        }
    }

    #[test]
    fn test_accumulation_sums_per_source() {
        let mut engine = ReconciliationEngine::new();
        engine.add_record(&electric_record("2023-11-25", 100.0, 300.0));
        engine.add_record(&solar_record("2023-11-25", 101.0, 400.0));
        engine.add_record(&gas_record("2023-11-25", 41.0, 11.0));

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries.len(), 1);

        let nov = &summaries[0];
        assert_eq!(nov.month, "2023-11");
        assert_eq!(nov.bucket.electric_cost, 100.0);
        assert_eq!(nov.bucket.imported_energy, 300.0);
        assert_eq!(nov.bucket.solar_cost, 101.0);
        assert_eq!(nov.bucket.inverter_production, 400.0);
        assert_eq!(nov.bucket.gas_cost, 41.0);
        assert_eq!(nov.bucket.therms_used, 11.0);
    }

    #[test]
    fn test_duplicate_accumulation_doubles_sums() {
        // At-most-once accumulation per document is the caller's contract;
        // the engine itself just keeps adding.
        let record = gas_record("2023-11-25", 41.0, 11.0);
        let mut engine = ReconciliationEngine::new();
        engine.add_record(&record);
        engine.add_record(&record);

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries[0].bucket.gas_cost, 82.0);
        assert_eq!(summaries[0].bucket.therms_used, 22.0);
    }

    #[test]
    fn test_credit_balance_overwrites_only_when_positive() {
        let mut engine = ReconciliationEngine::new();

        let mut first = electric_record("2023-11-22", 0.0, 0.0);
        if let BillFacts::Electric(facts) = &mut first.facts {
            facts.credit_balance = 96.12;
        }
        let second = electric_record("2023-11-25", 0.0, 0.0); // balance 0.0

        engine.add_record(&first);
        engine.add_record(&second);

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries[0].bucket.credit_balance, 96.12);
    }

    #[test]
    fn test_period_bounds_take_latest_record() {
        let mut engine = ReconciliationEngine::new();

        let mut first = electric_record("2023-11-22", 0.0, 0.0);
        if let BillFacts::Electric(facts) = &mut first.facts {
            facts.period_start = NaiveDate::from_ymd_opt(2023, 10, 15);
            facts.period_end = NaiveDate::from_ymd_opt(2023, 11, 14);
        }
        let mut second = electric_record("2023-11-25", 0.0, 0.0);
        if let BillFacts::Electric(facts) = &mut second.facts {
            facts.period_start = NaiveDate::from_ymd_opt(2023, 10, 18);
            facts.period_end = NaiveDate::from_ymd_opt(2023, 11, 17);
        }

        engine.add_record(&first);
        engine.add_record(&second);

        let summaries = engine.monthly_summaries();
        assert_eq!(
            summaries[0].bucket.period_start,
            NaiveDate::from_ymd_opt(2023, 10, 18)
        );
        assert_eq!(
            summaries[0].bucket.period_end,
            NaiveDate::from_ymd_opt(2023, 11, 17)
        );
    }

    #[test]
    fn test_production_priority_daily_over_meter_over_inverter() {
        let mut engine = ReconciliationEngine::new();

        let mut electric = electric_record("2023-11-25", 0.0, 0.0);
        if let BillFacts::Electric(facts) = &mut electric.facts {
            facts.meter_production = 500.0;
            facts.period_start = NaiveDate::from_ymd_opt(2023, 10, 15);
            facts.period_end = NaiveDate::from_ymd_opt(2023, 11, 14);
        }
        engine.add_record(&electric);
        engine.add_record(&solar_record("2023-11-25", 0.0, 300.0));

        // 30 days at 15 kWh/day inside the back-shifted window
        // [Oct 14, Nov 13] sums to 450.
        let mut series = DailyProduction::new();
        let mut day = NaiveDate::from_ymd_opt(2023, 10, 14).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 11, 13).unwrap();
        while day < end {
            series.insert(day, 15.0);
            day = day + Days::new(1);
        }
        engine.set_daily_production(series);

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries[0].total_production, 450.0);
    }

    #[test]
    fn test_daily_series_without_period_bounds_uses_calendar_month() {
        let mut engine = ReconciliationEngine::new();
        engine.add_record(&solar_record("2023-11-25", 0.0, 300.0));

        let mut series = DailyProduction::new();
        series.insert(NaiveDate::from_ymd_opt(2023, 11, 5).unwrap(), 12.5);
        series.insert(NaiveDate::from_ymd_opt(2023, 11, 6).unwrap(), 10.0);
        series.insert(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(), 99.0);
        engine.set_daily_production(series);

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries[0].month, "2023-11");
        assert_eq!(summaries[0].total_production, 22.5);
    }

    #[test]
    fn test_empty_daily_series_falls_back_to_meter() {
        let mut engine = ReconciliationEngine::new();

        let mut electric = electric_record("2023-11-25", 0.0, 0.0);
        if let BillFacts::Electric(facts) = &mut electric.facts {
            facts.meter_production = 500.0;
        }
        engine.add_record(&electric);
        engine.set_daily_production(DailyProduction::new());

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries[0].total_production, 500.0);
    }

    #[test]
    fn test_end_to_end_net_metering_month() {
        // Three electric bills land in one ledger month with net usage
        // -200, -100 and +50, plus 280 kWh of metered production.
        let mut engine = ReconciliationEngine::new();
        let mut a = electric_record("2023-11-22", 10.0, -200.0);
        if let BillFacts::Electric(facts) = &mut a.facts {
            facts.meter_production = 280.0;
        }
        engine.add_record(&a);
        engine.add_record(&electric_record("2023-11-25", 10.0, -100.0));
        engine.add_record(&electric_record("2023-11-28", 10.0, 50.0));

        let summaries = engine.monthly_summaries();
        assert_eq!(summaries.len(), 1);
        let month = &summaries[0];

        assert_eq!(month.bucket.exported_energy, 300.0);
        assert_eq!(month.bucket.imported_energy, 50.0);
        assert_eq!(month.total_production, 280.0);
        assert_eq!(month.self_use, 0.0); // max(0, 280 - 300)
        assert_eq!(month.true_consumption, 50.0);
        assert_eq!(month.net_position, 230.0);
        assert_eq!(month.total_cost, 30.0);
        assert_eq!(month.effective_rate, 30.0 / 50.0);
    }

    #[test]
    fn test_self_use_never_exceeds_production() {
        let mut engine = ReconciliationEngine::new();
        let mut record = electric_record("2023-11-25", 0.0, -100.0);
        if let BillFacts::Electric(facts) = &mut record.facts {
            facts.meter_production = 400.0;
        }
        engine.add_record(&record);

        let month = &engine.monthly_summaries()[0];
        assert!(month.self_use >= 0.0);
        assert!(month.self_use <= month.total_production);
        assert_eq!(month.self_use, 300.0);
    }

    #[test]
    fn test_gas_conversion_constant() {
        let mut engine = ReconciliationEngine::new();
        engine.add_record(&gas_record("2023-11-25", 41.03, 11.0));

        let month = &engine.monthly_summaries()[0];
        assert_eq!(month.gas_energy_equivalent, 322.3);
        assert_eq!(month.total_energy_cost, 41.03);
        assert_eq!(month.total_energy_equivalent, 322.3);
    }

    #[test]
    fn test_effective_rate_guarded_against_zero_consumption() {
        let mut engine = ReconciliationEngine::new();
        engine.add_record(&electric_record("2023-11-25", 25.0, 0.0));

        let month = &engine.monthly_summaries()[0];
        assert_eq!(month.true_consumption, 0.0);
        assert_eq!(month.effective_rate, 0.0);
    }

    #[test]
    fn test_summaries_sorted_by_month_key() {
        let mut engine = ReconciliationEngine::new();
        engine.add_record(&gas_record("2024-01-25", 1.0, 1.0));
        engine.add_record(&gas_record("2023-10-25", 1.0, 1.0));
        engine.add_record(&gas_record("2023-12-25", 1.0, 1.0));

        let keys: Vec<String> = engine
            .monthly_summaries()
            .into_iter()
            .map(|s| s.month)
            .collect();
        assert_eq!(keys, vec!["2023-10", "2023-12", "2024-01"]);
    }
}
