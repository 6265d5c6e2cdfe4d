//! Outbound chat delivery.

pub mod whatsapp;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Delivers `body` as one plain-text message to `to`.
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;
}

/// Cuts `text` to at most `max_chars` characters for logging.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
