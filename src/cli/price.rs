use crate::core::PriceAggregator;
use crate::core::report::{now_wib, render_price_message};
use anyhow::Result;

/// Fetches the current prices once and prints the chat report to stdout.
pub async fn price(aggregator: &PriceAggregator) -> Result<()> {
    let snapshot = aggregator.snapshot().await;
    println!("{}", render_price_message(&snapshot, &now_wib()));
    Ok(())
}
