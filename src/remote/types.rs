use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::engine::DailyProduction;

/// Response from the monitoring API's energy-lifetime endpoint: one
/// watt-hour reading per day, starting at `start_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnergyLifetimeResponse {
    pub system_id: Option<u64>,
    pub start_date: NaiveDate,
    pub production: Vec<f64>,
}

impl EnergyLifetimeResponse {
    /// Converts the per-day watt-hour array into a date-keyed kWh series.
    pub fn into_daily_production(self) -> DailyProduction {
        self.production
            .into_iter()
            .enumerate()
            .map(|(offset, watt_hours)| {
                let date = self.start_date + Days::new(offset as u64);
                (date, watt_hours / 1000.0)
            })
            .collect()
    }
}
