//! Helpers for finding prices in scraped HTML.

use crate::core::extract::extract_amount;
use regex::Regex;
use std::sync::LazyLock;

static HIDDEN_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)\s*>|<!--.*?-->")
        .expect("Invalid regex")
});
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));
static RUPIAH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Rp\.?\s*[\d.,]+").expect("Invalid regex"));

/// A rupiah amount carrying an explicit per-gram suffix.
pub static PER_GRAM_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Rp\.?\s*[\d.,]+\s*(?:/\s*(?:gram|gr|g)\b|per\s*gram\b)")
        .expect("Invalid regex")
});

/// Returns the text a browser would render: scripts, styles and comments
/// removed, tags replaced by spaces, common entities decoded and whitespace
/// collapsed.
pub fn visible_text(html: &str) -> String {
    let without_hidden = HIDDEN_BLOCKS.replace_all(html, " ");
    let without_tags = TAGS.replace_all(&without_hidden, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Runs `pattern` over `text` and reads the amount from the first `Rp` token
/// inside the match. `pattern` is expected to end in such a token.
pub fn find_rupiah(text: &str, pattern: &Regex) -> Option<u64> {
    pattern.find_iter(text).find_map(|m| {
        RUPIAH_TOKEN
            .find(m.as_str())
            .and_then(|token| extract_amount(token.as_str()))
            .filter(|amount| *amount > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_strips_markup() {
        let html = r#"<html><head><style>.a { color: red }</style>
            <script>var price = "Rp 1";</script></head>
            <body><!-- Rp 2 --><table><tr><td>1&nbsp;gr</td>
            <td><b>Rp 1.245.000</b></td></tr></table></body></html>"#;

        assert_eq!(visible_text(html), "1 gr Rp 1.245.000");
    }

    #[test]
    fn test_find_rupiah_in_window() {
        let pattern = Regex::new(r"(?i)\b1\s*gr\b.{0,20}?Rp\s*[\d.,]+").unwrap();

        assert_eq!(
            find_rupiah("0.5 gr Rp 700.000 1 gr Rp 1.245.000", &pattern),
            Some(1_245_000)
        );
        assert_eq!(
            find_rupiah("1 gr harga hari ini belum tersedia Rp 1.245.000", &pattern),
            None
        );
        assert_eq!(find_rupiah("nothing here", &pattern), None);
    }

    #[test]
    fn test_find_rupiah_skips_zero() {
        let pattern = Regex::new(r"(?i)Rp\s*[\d.,]+").unwrap();
        assert_eq!(find_rupiah("Rp 0 Rp 1.100.000", &pattern), Some(1_100_000));
    }
}
