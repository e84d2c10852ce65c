/// Length in characters (Unicode scalar values), not bytes.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// First `max_chars` characters of `text`, for logs and error messages.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// True if the text contains hiragana or katakana.
///
/// Kanji alone is not enough, since it may just as well be Chinese.
pub fn contains_kana(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}'))
}

/// Whether a free-form target language name means Japanese.
pub fn is_japanese_target(target_language: &str) -> bool {
    let target = target_language.trim();
    target == "日本語"
        || target.eq_ignore_ascii_case("japanese")
        || target.eq_ignore_ascii_case("ja")
}
