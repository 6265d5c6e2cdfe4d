use super::util::{get_success, http_client};
use crate::core::SpotPriceProvider;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Spot metal prices from goldapi.io, quoted per troy ounce.
pub struct GoldApiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoldApiProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(GoldApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoldApiResponse {
    price: Option<f64>,
}

#[async_trait]
impl SpotPriceProvider for GoldApiProvider {
    #[instrument(name = "GoldApiFetch", skip(self))]
    async fn spot_price(&self, metal: &str, currency: &str) -> Result<f64> {
        let url = format!("{}/api/{}/{}", self.base_url, metal, currency);
        debug!("Requesting spot price from {}", url);

        let response = get_success(
            || self.client.get(&url).header("x-access-token", &self.api_key),
            1,
        )
        .await?;
        let text = response.text().await?;

        let data: GoldApiResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {metal}/{currency}: {e}"))?;

        data.price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| anyhow!("No spot price found for {metal}/{currency}"))
    }
}
