use super::util::{get_success, http_client};
use crate::core::CurrencyRateProvider;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Exchange rates from exchangerate-api.com (v6, keyed).
pub struct ExchangeRateProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ExchangeRateProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(ExchangeRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let url = format!("{}/v6/{}/latest/{}", self.base_url, self.api_key, from);
        debug!("Requesting {from} rates");

        let response = get_success(|| self.client.get(&url), 1).await?;
        let text = response.text().await?;

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {from}{to}: {e}"))?;

        data.conversion_rates
            .get(to)
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {from}{to}"))
    }
}
