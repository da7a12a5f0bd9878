//! File-boundary aware diff chunking.
//!
//! A diff is split at every `diff --git ` line into per-file segments. Each
//! segment longer than the limit is hard-truncated, then segments are packed
//! greedily in order. Text before the first marker is not part of any file
//! and is dropped. Limits are in characters.

use std::sync::OnceLock;

use regex::Regex;

fn file_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^diff --git ").expect("valid diff header regex"))
}

/// Splits `content` into chunks of at most `max_chars` characters.
///
/// - no marker: one chunk with the first `max_chars` characters
/// - never returns an empty chunk (empty input gives no chunks)
/// - deterministic, order preserving
pub fn chunk_diff(content: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let starts: Vec<usize> = file_header().find_iter(content).map(|m| m.start()).collect();

    if starts.is_empty() {
        let head = truncate_chars(content, max_chars);
        return if head.is_empty() {
            Vec::new()
        } else {
            vec![head.to_string()]
        };
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        let segment = truncate_chars(&content[start..end], max_chars);
        let seg_len = segment.chars().count();

        if !current.is_empty() && current_len + seg_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(segment);
        current_len += seg_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Characters before the first file marker; 0 when there is no marker.
pub fn preamble_chars(content: &str) -> usize {
    file_header()
        .find(content)
        .map_or(0, |m| content[..m.start()].chars().count())
}

/// Longest prefix of `s` with at most `max` characters.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
