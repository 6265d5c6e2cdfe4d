//! Renders price snapshots as short plain-text chat messages.

use crate::core::price::PriceSnapshot;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

const HEADER: &str = "💰 Harga Emas (IDR/gram)";
const DIVIDER: &str = "──────────────";
const MAX_NOTES: usize = 2;

/// Western Indonesia Time, UTC+7.
pub fn wib() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("UTC+7 is a valid offset")
}

pub fn now_wib() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&wib())
}

/// Formats a timestamp as `16 Oct 2026 14:05 WIB` in UTC+7.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&wib())
        .format("%d %b %Y %H:%M WIB")
        .to_string()
}

/// Formats an amount with a rupiah prefix and `.` thousands separators.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("Rp {grouped}")
}

/// Median of `values`; even counts average the two middle values,
/// truncating to an integer.
pub fn median(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(((sorted[mid - 1] as u128 + sorted[mid] as u128) / 2) as u64)
    }
}

/// `max - min`, defined only for two or more values.
pub fn spread(values: &[u64]) -> Option<u64> {
    if values.len() < 2 {
        return None;
    }
    let max = values.iter().max()?;
    let min = values.iter().min()?;
    Some(max - min)
}

/// The timestamp line closing every reply.
pub fn timestamp_line<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("⏱ {}", format_timestamp(at))
}

/// Builds the price report for `snapshot`, stamped with `at`.
pub fn render_price_message<Tz: TimeZone>(snapshot: &PriceSnapshot, at: &DateTime<Tz>) -> String {
    let values = snapshot.prices.values();
    let Some(median) = median(&values) else {
        return [
            "Maaf, semua sumber harga emas sedang gagal.".to_string(),
            "Coba lagi beberapa menit.".to_string(),
            timestamp_line(at),
        ]
        .join("\n");
    };

    let mut lines = vec![HEADER.to_string(), DIVIDER.to_string()];
    for (label, value) in snapshot.prices.iter() {
        lines.push(format!("{label}: {}", format_rupiah(value)));
    }
    lines.push(DIVIDER.to_string());
    lines.push(format!("📊 Median: {}", format_rupiah(median)));
    if let Some(spread) = spread(&values) {
        lines.push(format!("↔️ Spread: {}", format_rupiah(spread)));
    }

    let notes = snapshot.notes.head(MAX_NOTES);
    if !notes.is_empty() {
        lines.push(String::new());
        lines.push(format!("ℹ️ {}", notes.join(" | ")));
    }

    lines.push(timestamp_line(at));
    lines.join("\n")
}
