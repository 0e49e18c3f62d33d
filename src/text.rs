//! Text cleanup shared by the normalizer, the model builder and the scorer.
//!
//! Corpus text and query text must pass through the same pipeline, otherwise
//! query vectors land in a different space than the document matrix.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::db::Followup;

static NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-zA-Z ]+").expect("valid regex"));
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(" +").expect("valid regex"));

/// Clean a string of nonessential characters for TF-IDF: strip punctuation
/// and digits, collapse runs of spaces, lowercase, trim.
#[must_use]
pub fn clean(input: &str) -> String {
    let only_letters = NON_LETTERS.replace_all(input, " ");
    let collapsed = MULTI_SPACE.replace_all(&only_letters, " ");
    collapsed.trim().to_lowercase()
}

/// Flatten a post's followup thread into one string: each followup's text
/// followed by its responses, in order.
#[must_use]
pub fn stringify_followups(followups: &[Followup]) -> String {
    let mut parts = Vec::new();
    for followup in followups {
        parts.push(followup.text.as_str());
        parts.extend(followup.responses.iter().map(String::as_str));
    }
    parts.join(" ")
}
