//! Key-phrase and topic fallbacks: token frequency ranking.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "if", "then", "else", "when", "while", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "from", "down", "out", "off", "over", "under", "again", "further",
        "once", "here", "there", "where", "which", "who", "whom", "this", "that", "these",
        "those", "what", "their", "they", "them", "then", "than", "because", "have", "has",
        "had", "having", "does", "doing", "would", "could", "should", "will", "shall", "being",
        "been", "were", "was", "are", "is", "not", "only", "same", "such", "very", "more",
        "most", "other", "some", "also", "into", "your", "yours",
    ]
    .into_iter()
    .collect()
});

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Rank tokens by frequency, longest-count first; ties break alphabetically
/// for deterministic output.
fn ranked_tokens(text: &str, min_len: usize, skip_stopwords: bool) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokens(text) {
        if token.chars().count() <= min_len {
            continue;
        }
        if skip_stopwords && STOPWORDS.contains(token.as_str()) {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Key-phrase fallback: frequency over words longer than 3 characters, top 10.
pub fn extract_key_phrases(text: &str) -> Vec<String> {
    ranked_tokens(text, 3, false)
        .into_iter()
        .take(10)
        .map(|(word, _)| word)
        .collect()
}

/// Topic fallback: frequency-ranked non-stopword tokens longer than 4
/// characters, top 5.
pub fn extract_topics(text: &str) -> Vec<String> {
    ranked_tokens(text, 4, true)
        .into_iter()
        .take(5)
        .map(|(word, _)| word)
        .collect()
}
