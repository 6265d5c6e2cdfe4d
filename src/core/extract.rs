//! Pulls integer amounts out of noisy, locale-formatted text.

/// Extracts the first run of digits from `text`, skipping `.`/`,` group
/// separators and any currency prefix, and parses it as an integer.
///
/// Separators are stripped rather than read as decimal points, so
/// `"Rp 1.245.000"` yields `1245000`. Returns `None` when the text holds no
/// digits or the number does not fit in a `u64`.
pub fn extract_amount(text: &str) -> Option<u64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .filter(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
