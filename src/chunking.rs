//! Sliding-window text chunking with sentence-aware boundaries.
//!
//! The splitter is a pure function of its input: same text, same chunks.
//! Windows overlap so that context straddling a cut survives in at least one
//! chunk, and a cut is moved back to the nearest sentence terminator or
//! newline when one lies past the midpoint of the window.

/// Default window size in characters.
pub const DEFAULT_TARGET_SIZE: usize = 1000;
/// Default overlap between consecutive windows in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Splits `text` into overlapping chunks of at most `target_size` characters
/// (plus one, when a window extends to swallow its closing terminator).
///
/// The chunk spans form a contiguous cover of the input: every character
/// belongs to at least one window. Each produced chunk is trimmed, and
/// empty or whitespace-only chunks are dropped. Input shorter than
/// `target_size` yields a single chunk, or none when it is blank.
///
/// Sizes are counted in Unicode scalar values; a window never cuts inside a
/// code point.
pub fn split_into_chunks(text: &str, target_size: usize, overlap: usize) -> Vec<String> {
    if target_size == 0 {
        return Vec::new();
    }
    // Overlap must leave forward progress per window.
    let overlap = overlap.min(target_size.saturating_sub(1));

    let offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let byte_end = |pos: usize| {
        if pos < total {
            offsets[pos]
        } else {
            text.len()
        }
    };

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < total {
        let mut end = start + target_size;
        if end >= total {
            push_trimmed(&mut chunks, &text[offsets[start]..]);
            break;
        }

        if let Some(break_point) = last_break(&chars, start + target_size / 2, end) {
            end = break_point + 1;
        }

        push_trimmed(&mut chunks, &text[offsets[start]..byte_end(end)]);

        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

/// Finds the last sentence terminator or newline at an index in
/// `(floor, limit]`, searching backward from `limit`.
fn last_break(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    (floor + 1..=limit)
        .rev()
        .find(|&index| matches!(chars[index], '.' | '\n'))
}

fn push_trimmed(chunks: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Collapses runs of whitespace: horizontal runs become a single space,
/// runs containing a newline become a single newline. Leading and trailing
/// whitespace is removed.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Option<char> = None;
    for c in text.chars() {
        if c.is_whitespace() {
            let separator = if c == '\n' || pending == Some('\n') {
                '\n'
            } else {
                ' '
            };
            pending = Some(separator);
        } else {
            if let Some(separator) = pending.take() {
                if !out.is_empty() {
                    out.push(separator);
                }
            }
            out.push(c);
        }
    }
    out
}
