//! Leaf text utilities: cosine similarity and keyword extraction.
//!
//! These are the shared primitives under the semantic lookup path of
//! [`ResponseCache`](crate::ResponseCache) and the overlap heuristics of
//! [`TopicTracker`](crate::TopicTracker). Pure functions, no allocation
//! beyond the returned vectors, no I/O.

/// Stop words excluded from keyword extraction.
///
/// Function words that carry no topical signal. Tokens of length ≤ 2 are
/// dropped before this list is consulted, so two-letter words need no entry.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "what", "when", "where", "which", "how", "why",
    "who", "can", "could", "would", "should", "you", "your", "yours", "are", "was", "were", "have",
    "has", "had", "will", "just", "like", "want", "need", "get", "got", "make", "made", "about",
    "from", "into", "over", "under", "please", "tell", "give", "show", "does", "did", "doing",
    "not", "but", "they", "them", "their", "there", "then", "than", "some", "any", "all", "its",
    "his", "her", "him", "she", "our", "out", "one", "two", "let", "lets", "okay", "yes", "yeah",
];

/// Cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]` for well-formed inputs. Degenerate input
/// (mismatched lengths, empty vectors, zero magnitude) short-circuits to
/// `0.0` — a "no match" score, never an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Extract up to `max` keywords from free text.
///
/// Lowercases, strips non-alphanumeric characters, drops tokens of length
/// ≤ 2 and stop words, deduplicates, then sorts longest-first and takes the
/// top `max`. Longer tokens tend to be the content-bearing ones in short
/// chat messages, which is all the precision this heuristic needs.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(t))
    {
        if !keywords.iter().any(|k| k == token) {
            keywords.push(token.to_string());
        }
    }
    // Stable sort keeps first-occurrence order among equal lengths.
    keywords.sort_by(|a, b| b.len().cmp(&a.len()));
    keywords.truncate(max);
    keywords
}

/// Whether `text` contains `phrase` as a whole word sequence.
///
/// Both sides are compared word-by-word on whitespace, so the phrase
/// `"hi"` does not match "history" the way a raw substring test would.
/// Callers are expected to pass already-normalized (lowercased) text.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words.windows(needle.len()).any(|w| w == needle.as_slice())
}
