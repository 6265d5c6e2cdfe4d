//! Core business logic abstractions

pub mod aggregate;
pub mod cache;
pub mod command;
pub mod config;
pub mod currency;
pub mod extract;
pub mod log;
pub mod price;
pub mod report;

// Re-export main types for cleaner imports
pub use aggregate::{AggregatorSettings, PriceAggregator};
pub use currency::{CurrencyRateProvider, SpotPriceProvider};
pub use price::{NoteList, PriceQuote, PriceSet, PriceSnapshot, PriceSource, SourceRole};
