//! Fragment text normalization
//!
//! Reduces raw OCR text to the plate alphabet: uppercase `A-Z` and `0-9`.

use unicode_normalization::UnicodeNormalization;

/// Normalize a raw OCR fragment.
///
/// Accents are decomposed (NFKD) and the combining marks dropped together with
/// every other non-ASCII character. The rest is uppercased and anything outside
/// `A-Z0-9` is removed. Total: empty or unreadable input yields `""`.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_uppercase())
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
