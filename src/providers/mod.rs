pub mod exchangerate;
pub mod goldapi;
pub mod harga_emas;
pub mod html;
pub mod logam_mulia;
pub mod spot;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::{CurrencyRateProvider, PriceAggregator, SourceRole, SpotPriceProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Wires the three gold price sources into an aggregator, in display order:
/// LogamMulia (trusted), harga-emas.org (checked against spot) and the
/// spot+FX pair (reference).
pub fn build_aggregator(config: &AppConfig) -> Result<PriceAggregator> {
    let settings = config.aggregation.settings();
    let timeout = settings.fetch_timeout;
    let providers = &config.providers;

    let spot_provider = providers
        .goldapi
        .api_key
        .as_deref()
        .map(|key| goldapi::GoldApiProvider::new(&providers.goldapi.base_url, key, timeout))
        .transpose()?
        .map(|p| Arc::new(p) as Arc<dyn SpotPriceProvider>);
    let rate_provider = providers
        .exchangerate
        .api_key
        .as_deref()
        .map(|key| {
            exchangerate::ExchangeRateProvider::new(&providers.exchangerate.base_url, key, timeout)
        })
        .transpose()?
        .map(|p| Arc::new(p) as Arc<dyn CurrencyRateProvider>);
    info!(
        spot = spot_provider.is_some(),
        fx = rate_provider.is_some(),
        "Configured spot price providers"
    );

    Ok(PriceAggregator::new(settings)
        .with_source(
            Arc::new(logam_mulia::LogamMuliaProvider::new(
                &providers.logam_mulia.base_url,
                timeout,
            )?),
            SourceRole::Trusted,
        )
        .with_source(
            Arc::new(harga_emas::HargaEmasProvider::new(
                &providers.harga_emas.base_url,
                timeout,
            )?),
            SourceRole::CrossChecked,
        )
        .with_source(
            Arc::new(spot::SpotFxSource::new(spot_provider, rate_provider)),
            SourceRole::Reference,
        ))
}
