//! Currency and unit conversion abstractions

use anyhow::Result;
use async_trait::async_trait;

/// Grams in one troy ounce.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// Quotes the spot price of a metal in a currency, per troy ounce.
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    async fn spot_price(&self, metal: &str, currency: &str) -> Result<f64>;
}

/// Converts a USD/troy-ounce spot price into IDR per gram.
///
/// Rounds half away from zero (`f64::round`), which is half-up for the
/// positive inputs this is called with.
pub fn usd_per_ounce_to_idr_per_gram(usd_per_troy_ounce: f64, usd_to_idr: f64) -> u64 {
    (usd_per_troy_ounce * usd_to_idr / GRAMS_PER_TROY_OUNCE).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_conversion() {
        assert_eq!(usd_per_ounce_to_idr_per_gram(2000.0, 15000.0), 964_522);
        assert_eq!(usd_per_ounce_to_idr_per_gram(2350.5, 16250.0), 1_228_018);
    }

    #[test]
    fn test_one_ounce_at_parity() {
        // 31.1034768 USD/oz at a rate of 1 is exactly 1 per gram
        assert_eq!(usd_per_ounce_to_idr_per_gram(GRAMS_PER_TROY_OUNCE, 1.0), 1);
    }
}
