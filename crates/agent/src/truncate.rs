//! Boundary-aware shortening of model replies.
//!
//! Replies are never cut mid-sentence. [`truncate`] reports `None` when it
//! cannot find a clean cut, and [`shape_reply`] walks the fallback chain
//! strict → loose → raw.

use serde::Serialize;

/// Characters that end a sentence. `\r\n` ends at its `\n`.
const BOUNDARIES: [char; 7] = ['.', '?', '!', '。', '？', '！', '\n'];

/// Cut `text` to at most `max_length` characters, ending on a sentence
/// boundary.
///
/// With `max_sentences = Some(n)` the scan stops after the `n`-th boundary;
/// `Some(0)` is the same as `None`. Returns `None` when the first
/// `max_length` characters contain no boundary.
pub fn truncate(text: &str, max_length: usize, max_sentences: Option<usize>) -> Option<&str> {
    let limit = max_sentences.filter(|&n| n > 0);
    let mut last_cut = None;
    let mut found = 0usize;

    for (byte_idx, ch) in text.char_indices().take(max_length) {
        if BOUNDARIES.contains(&ch) {
            last_cut = Some(byte_idx + ch.len_utf8());
            found += 1;
            if limit == Some(found) {
                break;
            }
        }
    }

    last_cut.map(|end| &text[..end])
}

/// Which step of the fallback chain produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Truncation {
    /// Cut within `limit` characters
    Strict,
    /// First sentence within `2 × limit` characters
    Loose,
    /// No clean cut; the reply is returned whole
    Raw,
}

/// Apply strict → loose → raw truncation to an already cleaned reply.
pub fn shape_reply(text: &str, limit: usize) -> (String, Truncation) {
    if let Some(cut) = truncate(text, limit, None) {
        return (cut.to_string(), Truncation::Strict);
    }
    if let Some(cut) = truncate(text, limit.saturating_mul(2), Some(1)) {
        return (cut.to_string(), Truncation::Loose);
    }
    (text.to_string(), Truncation::Raw)
}
