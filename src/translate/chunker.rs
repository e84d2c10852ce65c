use regex::Regex;
use std::sync::OnceLock;

use crate::utils::char_count;

/// Separator placed between paragraphs inside a chunk, and between
/// translated chunks on reassembly.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// One ordered slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Split `text` into chunks of at most `budget` characters.
///
/// Paragraphs (separated by one or more blank lines) are trimmed, blank
/// ones dropped, and packed greedily in order. A paragraph longer than the
/// budget on its own becomes a single oversized chunk.
pub fn split_into_chunks(text: &str, budget: usize) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in paragraph_break().split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        let paragraph_len = char_count(paragraph);
        let candidate_len = if current.is_empty() {
            paragraph_len
        } else {
            current_len + char_count(PARAGRAPH_SEPARATOR) + paragraph_len
        };

        if candidate_len <= budget {
            if !current.is_empty() {
                current.push_str(PARAGRAPH_SEPARATOR);
            }
            current.push_str(paragraph);
            current_len = candidate_len;
        } else {
            if !current.is_empty() {
                seal(&mut chunks, std::mem::take(&mut current));
            }
            current.push_str(paragraph);
            current_len = paragraph_len;
        }
    }

    if !current.is_empty() {
        seal(&mut chunks, current);
    }

    chunks
}

fn seal(chunks: &mut Vec<Chunk>, text: String) {
    let index = chunks.len();
    chunks.push(Chunk { index, text });
}

/// A newline, optional whitespace, then another newline.
fn paragraph_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}
