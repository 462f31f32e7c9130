//! Anchor-text cleaning for Thai-language pages.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum cleaned-anchor length for document admission.
pub const MIN_ANCHOR_LEN: usize = 5;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Everything outside Thai script, ASCII alphanumerics, whitespace, and
/// basic punctuation is stripped.
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\u{0E00}-\u{0E7F}a-zA-Z0-9\s\.,\-\(\)\[\]/]").expect("valid regex")
});

/// Clean and normalize anchor text: collapse runs of whitespace, trim, and
/// strip markup leftovers and control characters.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    DISALLOWED.replace_all(&collapsed, "").into_owned()
}

/// Whether cleaned anchor text is long enough to describe a document.
pub fn is_usable_anchor(cleaned: &str) -> bool {
    cleaned.chars().count() >= MIN_ANCHOR_LEN
}
