//! Keyword extraction and topic check.
//!
//! Matching is plain case-insensitive substring containment with no word
//! boundaries, so "home" is found inside "homeowner".

use crate::vocabulary::Vocabulary;

/// Vocabulary terms contained in `text`, in vocabulary order.
pub fn extract_keywords(vocabulary: &Vocabulary, text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    vocabulary
        .terms()
        .iter()
        .filter(|term| lower.contains(term.as_str()))
        .cloned()
        .collect()
}

/// True when at least one vocabulary term appears in `text`.
pub fn is_on_topic(vocabulary: &Vocabulary, text: &str) -> bool {
    let lower = text.to_lowercase();
    vocabulary
        .terms()
        .iter()
        .any(|term| lower.contains(term.as_str()))
}
