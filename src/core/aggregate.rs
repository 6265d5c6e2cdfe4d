//! Reconciles the configured price sources into one cached snapshot.

use crate::core::cache::Cache;
use crate::core::price::{NoteList, PriceQuote, PriceSet, PriceSnapshot, PriceSource, SourceRole};
use anyhow::{Result, anyhow};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SNAPSHOT_KEY: &str = "gold_prices";

#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    pub cache_ttl: Duration,
    /// Relative band, e.g. `0.03` for 3%.
    pub outlier_tolerance: f64,
    pub fetch_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            outlier_tolerance: 0.03,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

struct RegisteredSource {
    source: Arc<dyn PriceSource>,
    role: SourceRole,
}

/// Whether `candidate` lies within `tolerance` (relative) of `reference`.
pub fn within_tolerance(reference: u64, candidate: u64, tolerance: f64) -> bool {
    if reference == 0 {
        return false;
    }
    let diff = reference.abs_diff(candidate) as f64;
    diff / reference as f64 <= tolerance
}

pub struct PriceAggregator {
    sources: Vec<RegisteredSource>,
    cache: Cache<&'static str, PriceSnapshot>,
    settings: AggregatorSettings,
}

impl PriceAggregator {
    pub fn new(settings: AggregatorSettings) -> Self {
        Self {
            sources: Vec::new(),
            cache: Cache::new(settings.cache_ttl),
            settings,
        }
    }

    /// Registers a source. Registration order is the display order.
    pub fn with_source(mut self, source: Arc<dyn PriceSource>, role: SourceRole) -> Self {
        self.sources.push(RegisteredSource { source, role });
        self
    }

    /// Returns the cached snapshot while it is live, otherwise fetches every
    /// source concurrently and reconciles the results.
    pub async fn snapshot(&self) -> PriceSnapshot {
        self.cache
            .get_or_refresh(SNAPSHOT_KEY, || self.refresh())
            .await
    }

    /// Drops the cached snapshot so the next call refetches.
    pub async fn invalidate(&self) {
        self.cache.remove(&SNAPSHOT_KEY).await;
    }

    async fn refresh(&self) -> PriceSnapshot {
        info!(sources = self.sources.len(), "Fetching gold prices");

        let fetches = self.sources.iter().map(|registered| {
            let source = Arc::clone(&registered.source);
            let timeout = self.settings.fetch_timeout;
            async move { fetch_with_timeout(source.as_ref(), timeout).await }
        });
        let results = join_all(fetches).await;

        self.reconcile(results)
    }

    fn reconcile(&self, results: Vec<Result<Option<PriceQuote>>>) -> PriceSnapshot {
        let reference = self
            .sources
            .iter()
            .zip(results.iter())
            .find_map(|(registered, result)| match (registered.role, result) {
                (SourceRole::Reference, Ok(Some(quote))) => Some(quote.idr_per_gram()),
                _ => None,
            });

        let mut prices = PriceSet::new();
        let mut notes = NoteList::new();

        for (registered, result) in self.sources.iter().zip(results) {
            let source = registered.source.as_ref();
            let quote = match result {
                Ok(Some(quote)) => quote,
                Ok(None) => {
                    debug!(source = source.name(), "Source disabled");
                    notes.push(source.disabled_note());
                    continue;
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Source unavailable");
                    notes.push(source.unavailable_note());
                    continue;
                }
            };

            let value = quote.idr_per_gram();
            if let (SourceRole::CrossChecked, Some(reference)) = (registered.role, reference)
                && !within_tolerance(reference, value, self.settings.outlier_tolerance)
            {
                warn!(
                    source = source.name(),
                    value,
                    reference,
                    "Dropping price outside tolerance"
                );
                notes.push(source.outlier_note());
                continue;
            }

            prices.insert(source.label(), value);
        }

        debug!(prices = ?prices, notes = ?notes, "Reconciled gold prices");
        PriceSnapshot { prices, notes }
    }
}

async fn fetch_with_timeout(
    source: &dyn PriceSource,
    timeout: Duration,
) -> Result<Option<PriceQuote>> {
    tokio::time::timeout(timeout, source.fetch_quote())
        .await
        .map_err(|_| anyhow!("{} timed out after {:?}", source.name(), timeout))?
}
