//! Keyword normalization shared by the collector and cache keys.

/// Normalizes a raw keyword: trims, lowercases, and collapses internal
/// whitespace runs to single spaces. Returns an empty string for
/// whitespace-only input, which the collector rejects.
#[must_use]
pub fn normalize_keyword(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
