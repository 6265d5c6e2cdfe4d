//! Pricing abstractions and core types

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::Serialize;

/// A single normalized gold price, in IDR per gram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    source: String,
    idr_per_gram: u64,
    detail: Option<String>,
}

impl PriceQuote {
    pub fn new(source: &str, idr_per_gram: u64) -> Result<Self> {
        if idr_per_gram == 0 {
            bail!("Non-positive price from {source}");
        }
        Ok(Self {
            source: source.to_string(),
            idr_per_gram,
            detail: None,
        })
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn idr_per_gram(&self) -> u64 {
        self.idr_per_gram
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Prices keyed by source label, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceSet {
    entries: Vec<(String, u64)>,
}

impl PriceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the price for `label`. Zero prices are ignored.
    pub fn insert(&mut self, label: &str, idr_per_gram: u64) {
        if idr_per_gram == 0 {
            return;
        }
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = idr_per_gram,
            None => self.entries.push((label.to_string(), idr_per_gram)),
        }
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn values(&self) -> Vec<u64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Short unavailability and outlier reasons, in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteList {
    notes: Vec<String>,
}

impl NoteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(String::as_str)
    }

    /// The first `n` notes, the only ones shown to users.
    pub fn head(&self, n: usize) -> &[String] {
        &self.notes[..self.notes.len().min(n)]
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// One reconciled aggregation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceSnapshot {
    pub prices: PriceSet,
    pub notes: NoteList,
}

/// How the aggregator treats a source's value relative to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// Authoritative value other sources are checked against.
    Reference,
    /// Accepted only within the outlier tolerance of the reference.
    CrossChecked,
    /// Always accepted.
    Trusted,
}

/// A named gold price source.
///
/// `fetch_quote` returns `Ok(None)` when the source is switched off (e.g. no
/// credentials) and `Err` when it was attempted and failed.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Label shown next to the price in reports.
    fn label(&self) -> &str;

    /// Short name used in notes.
    fn name(&self) -> &str;

    async fn fetch_quote(&self) -> Result<Option<PriceQuote>>;

    fn unavailable_note(&self) -> String {
        format!("{} unavailable", self.name())
    }

    fn disabled_note(&self) -> String {
        format!("{} disabled", self.name())
    }

    fn outlier_note(&self) -> String {
        format!("{} ignored (outlier/wrong field)", self.name())
    }
}
