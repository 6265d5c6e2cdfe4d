use super::html::{PER_GRAM_PRICE, find_rupiah, visible_text};
use super::util::{get_success, http_client};
use crate::core::{PriceQuote, PriceSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

/// "Emas 24 Karat" followed within 200 characters by a rupiah amount.
static KARAT_24_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Emas\s*24\s*Karat.{0,200}?Rp\.?\s*[\d.,]+").expect("Invalid regex")
});

/// 24K gold price scraped from harga-emas.org.
pub struct HargaEmasProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HargaEmasProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(HargaEmasProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

fn find_price(text: &str) -> Option<u64> {
    find_rupiah(text, &KARAT_24_PRICE).or_else(|| find_rupiah(text, &PER_GRAM_PRICE))
}

/// Reads the 24K per-gram price, first from the rendered text and then from
/// the raw markup for values that only live in attributes or scripts.
pub fn parse_price(html: &str) -> Option<u64> {
    find_price(&visible_text(html)).or_else(|| {
        debug!("No price in rendered text, scanning raw markup");
        find_price(html)
    })
}

#[async_trait]
impl PriceSource for HargaEmasProvider {
    fn label(&self) -> &str {
        "Harga-Emas.org (24K)"
    }

    fn name(&self) -> &str {
        "Harga-Emas"
    }

    #[instrument(name = "HargaEmasFetch", skip(self))]
    async fn fetch_quote(&self) -> Result<Option<PriceQuote>> {
        let url = format!("{}/", self.base_url);
        debug!("Requesting price page from {}", url);

        let response = get_success(|| self.client.get(&url), 0).await?;
        let body = response
            .text()
            .await
            .context("Failed to read harga-emas.org response")?;

        let price = parse_price(&body).ok_or_else(|| anyhow!("No 24K price found on {url}"))?;
        debug!(price, "Parsed harga-emas.org price");
        Ok(Some(PriceQuote::new(self.name(), price)?.with_detail("24K")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOCK_PAGE: &str = r#"<html><body>
        <div class="title">Harga Emas Hari Ini</div>
        <table>
          <tr><td>Emas 24 Karat</td><td>per gram</td><td>Rp 1.312.450</td></tr>
          <tr><td>Emas 22 Karat</td><td>per gram</td><td>Rp 1.203.080</td></tr>
        </table></body></html>"#;

    #[test]
    fn test_parse_24_karat_row() {
        assert_eq!(parse_price(MOCK_PAGE), Some(1_312_450));
    }

    #[test]
    fn test_parse_per_gram_suffixes() {
        for page in [
            "<p>Harga hari ini: Rp 1.300.000/gram</p>",
            "<p>Harga hari ini: Rp 1.300.000 / gr</p>",
            "<p>Harga hari ini: Rp1.300.000/g</p>",
            "<p>Harga hari ini: Rp 1.300.000 per gram</p>",
        ] {
            assert_eq!(parse_price(page), Some(1_300_000), "page: {page}");
        }
    }

    #[test]
    fn test_parse_falls_back_to_markup() {
        let page = r#"<div data-label="Emas 24 Karat" data-price="Rp 1.299.000"></div>"#;
        assert_eq!(parse_price(page), Some(1_299_000));
    }

    #[test]
    fn test_parse_without_match() {
        assert_eq!(parse_price("<p>Rp 1.300.000 per ons</p>"), None);
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_PAGE))
            .mount(&mock_server)
            .await;
        let provider = HargaEmasProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();

        let quote = provider.fetch_quote().await.unwrap().unwrap();
        assert_eq!(quote.idr_per_gram(), 1_312_450);
        assert_eq!(quote.detail(), Some("24K"));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(MOCK_PAGE)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;
        let provider =
            HargaEmasProvider::new(&mock_server.uri(), Duration::from_millis(100)).unwrap();

        assert!(provider.fetch_quote().await.is_err());
    }
}
