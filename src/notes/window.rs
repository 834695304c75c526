//! Text helpers shared by the generation-backed components.

/// The last `max_chars` characters of `history`.
pub fn trailing_window(history: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match history.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &history[start..],
        None => history,
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the first `max_words` words. Text already within the cap is returned
/// untouched; truncated text is re-joined with single spaces.
pub fn cap_words(text: &str, max_words: usize) -> String {
    if word_count(text) <= max_words {
        return text.to_string();
    }
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
