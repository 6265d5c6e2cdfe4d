use super::html::{PER_GRAM_PRICE, find_rupiah, visible_text};
use super::util::{get_success, http_client};
use crate::core::{PriceQuote, PriceSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

/// "1 gr" or "1 gram" line item followed within 120 characters by a rupiah
/// amount. The leading class keeps "0.1 gr" and "11 gr" out.
static ONE_GRAM_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\d.,])1\s*(?:gr|gram)\b.{0,120}?\bRp\.?\s*[\d.,]+")
        .expect("Invalid regex")
});

/// Antam bullion price scraped from the LogamMulia daily price page.
pub struct LogamMuliaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl LogamMuliaProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(LogamMuliaProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

/// Reads the 1 gram Antam price from the page's rendered text, falling back
/// to the first amount quoted per gram.
pub fn parse_price(html: &str) -> Option<u64> {
    let text = visible_text(html);
    find_rupiah(&text, &ONE_GRAM_PRICE).or_else(|| find_rupiah(&text, &PER_GRAM_PRICE))
}

#[async_trait]
impl PriceSource for LogamMuliaProvider {
    fn label(&self) -> &str {
        "Antam (LogamMulia)"
    }

    fn name(&self) -> &str {
        "Antam"
    }

    #[instrument(name = "LogamMuliaFetch", skip(self))]
    async fn fetch_quote(&self) -> Result<Option<PriceQuote>> {
        let url = format!("{}/id/harga-emas-hari-ini", self.base_url);
        debug!("Requesting price page from {}", url);

        let response = get_success(|| self.client.get(&url), 0).await?;
        let body = response
            .text()
            .await
            .context("Failed to read LogamMulia response")?;

        let price = parse_price(&body).ok_or_else(|| anyhow!("No 1 gr price found on {url}"))?;
        debug!(price, "Parsed LogamMulia price");
        Ok(Some(PriceQuote::new(self.name(), price)?.with_detail("1 gr")))
    }
}
