use chrono::NaiveDate;
use reqwest::Client;

use crate::engine::DailyProduction;
use crate::error::{LedgerError, Result};
use crate::remote::types::EnergyLifetimeResponse;

const ENLIGHTEN_BASE_URL: &str = "https://api.enphaseenergy.com/api/v2";

/// Thin client for the solar-monitoring vendor's reporting API. The only
/// call the ledger needs is the daily production series, which it installs
/// into the reconciliation engine as ground truth.
#[derive(Clone)]
pub struct ProductionClient {
    client: Client,
    api_key: String,
    user_id: String,
    base_url: String,
}

impl ProductionClient {
    pub fn new(api_key: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            user_id: user_id.into(),
            base_url: ENLIGHTEN_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (e.g. a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the per-day production history for one system, optionally
    /// bounded below by `start_date`, as a date-keyed kWh series.
    pub async fn fetch_daily_production(
        &self,
        system_id: &str,
        start_date: Option<NaiveDate>,
    ) -> Result<DailyProduction> {
        let url = format!("{}/systems/{}/energy_lifetime", self.base_url, system_id);

        let mut request = self
            .client
            .get(&url)
            .query(&[("key", &self.api_key), ("user_id", &self.user_id)]);
        if let Some(start) = start_date {
            request = request.query(&[("start_date", start.format("%Y-%m-%d").to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Api(format!(
                "energy_lifetime returned status {}: {}",
                status, body
            )));
        }

        let payload: EnergyLifetimeResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Api(format!("invalid energy_lifetime payload: {}", e)))?;

        Ok(payload.into_daily_production())
    }
}
