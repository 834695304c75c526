//! Tag → storage key.

use regex::Regex;
use std::sync::OnceLock;

/// Key used whenever a tag is empty or sanitizes to nothing
pub const FALLBACK_TAG: &str = "general";

/// Longest key, in characters
pub const MAX_KEY_CHARS: usize = 30;

/// Derive the filesystem-safe storage key for a raw tag.
///
/// Lower-cases, drops everything except ASCII letters, digits, `-`, `_` and
/// whitespace, turns each whitespace run into one `_`, and keeps the first 30
/// characters. Empty input or an empty result maps to [`FALLBACK_TAG`].
///
/// Idempotent: `sanitize_tag(&sanitize_tag(x)) == sanitize_tag(x)`.
pub fn sanitize_tag(raw: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    if raw.is_empty() {
        return FALLBACK_TAG.to_string();
    }

    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^a-z0-9_\-\s]").unwrap());
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let lowered = raw.to_lowercase();
    let kept = unsafe_chars.replace_all(&lowered, "");
    let joined = whitespace.replace_all(kept.trim(), "_");
    let key: String = joined.chars().take(MAX_KEY_CHARS).collect();

    if key.is_empty() {
        FALLBACK_TAG.to_string()
    } else {
        key
    }
}
