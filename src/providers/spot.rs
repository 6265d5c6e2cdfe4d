use crate::core::currency::usd_per_ounce_to_idr_per_gram;
use crate::core::{CurrencyRateProvider, PriceQuote, PriceSource, SpotPriceProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Spot XAU/USD converted to IDR per gram through a USD→IDR rate.
///
/// Either half may be missing when its credential is not configured. With
/// both missing the source reports itself disabled; with only one missing,
/// or a failed call, it is unavailable.
pub struct SpotFxSource {
    spot: Option<Arc<dyn SpotPriceProvider>>,
    rates: Option<Arc<dyn CurrencyRateProvider>>,
}

impl SpotFxSource {
    pub fn new(
        spot: Option<Arc<dyn SpotPriceProvider>>,
        rates: Option<Arc<dyn CurrencyRateProvider>>,
    ) -> Self {
        Self { spot, rates }
    }
}

#[async_trait]
impl PriceSource for SpotFxSource {
    fn label(&self) -> &str {
        "Spot (XAU/USD→IDR)"
    }

    fn name(&self) -> &str {
        "Spot"
    }

    async fn fetch_quote(&self) -> Result<Option<PriceQuote>> {
        if self.spot.is_none() && self.rates.is_none() {
            return Ok(None);
        }

        let spot = async {
            let provider = self.spot.as_ref()?;
            provider
                .spot_price("XAU", "USD")
                .await
                .inspect_err(|e| warn!(error = %e, "Spot price fetch failed"))
                .ok()
        };
        let rate = async {
            let provider = self.rates.as_ref()?;
            provider
                .get_rate("USD", "IDR")
                .await
                .inspect_err(|e| warn!(error = %e, "USD/IDR rate fetch failed"))
                .ok()
        };
        let (spot, rate) = tokio::join!(spot, rate);

        match (spot, rate) {
            (Some(spot), Some(rate)) => {
                let price = usd_per_ounce_to_idr_per_gram(spot, rate);
                debug!(spot, rate, price, "Converted spot price");
                Ok(Some(
                    PriceQuote::new(self.name(), price)?.with_detail(format!("{spot} USD/oz")),
                ))
            }
            (spot, rate) => Err(anyhow!(
                "Spot pair incomplete (spot: {}, rate: {})",
                spot.is_some(),
                rate.is_some()
            )),
        }
    }

    fn unavailable_note(&self) -> String {
        "Spot unavailable (call failed)".to_string()
    }

    fn disabled_note(&self) -> String {
        "Spot disabled (no API keys)".to_string()
    }
}
