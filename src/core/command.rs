//! Maps inbound chat text to bot commands and their replies.

use crate::core::aggregate::PriceAggregator;
use crate::core::report::{render_price_message, timestamp_line};
use chrono::{DateTime, TimeZone};

const PRICE_TOKENS: &[&str] = &["emas", "gold", "harga emas", "price", "antam"];
const HELP_TOKENS: &[&str] = &["help", "menu", "?", "hai", "halo", "hi"];

const FALLBACK_REPLY: &str = "Ketik *emas* untuk cek harga emas (IDR/gram).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Price,
    Help,
    Unknown,
}

/// Lowercases and collapses whitespace runs to single spaces.
pub fn normalize_command(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Command {
    /// Exact-match dispatch on the normalized text.
    pub fn parse(text: &str) -> Self {
        let normalized = normalize_command(text);
        if PRICE_TOKENS.contains(&normalized.as_str()) {
            Command::Price
        } else if HELP_TOKENS.contains(&normalized.as_str()) {
            Command::Help
        } else {
            Command::Unknown
        }
    }
}

pub fn help_message<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    [
        "Menu:".to_string(),
        "• *emas* / *gold* → harga emas IDR/gram (multi-source)".to_string(),
        "• *help* → menu".to_string(),
        timestamp_line(at),
    ]
    .join("\n")
}

/// Produces the reply text for `command`.
pub async fn reply_for<Tz: TimeZone>(
    command: Command,
    aggregator: &PriceAggregator,
    at: &DateTime<Tz>,
) -> String {
    match command {
        Command::Price => {
            let snapshot = aggregator.snapshot().await;
            render_price_message(&snapshot, at)
        }
        Command::Help => help_message(at),
        Command::Unknown => FALLBACK_REPLY.to_string(),
    }
}
