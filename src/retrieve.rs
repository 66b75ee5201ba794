//! Bag-of-words document retriever.
//!
//! Scores each document by the number of unique words it shares with the
//! query (both sides lowercased and split on whitespace) and returns the
//! top `k` texts with a strictly positive score. This is a deliberately
//! naive placeholder for a real retrieval index: no stemming, no stop-word
//! removal, no term weighting, no fuzzy matching.

use std::collections::HashSet;

use crate::models::Document;

/// Lowercase a text and split it on whitespace into its set of unique words.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Rank documents against a query.
///
/// Returns `(store index, score)` pairs sorted by score descending, ties
/// keeping store order, filtered to `score > 0` and truncated to `k`.
/// The result may hold fewer than `k` entries, including none.
pub fn rank(query: &str, docs: &[Document], k: usize) -> Vec<(usize, usize)> {
    let query_words = word_set(query);

    let mut scored: Vec<(usize, usize)> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let doc_words = word_set(&doc.text);
            let score = query_words.intersection(&doc_words).count();
            (i, score)
        })
        .collect();

    // sort_by is stable, so equal scores keep store order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(k)
        .filter(|(_, score)| *score > 0)
        .collect()
}

/// Retrieve the text of the top `k` documents overlapping the query.
pub fn retrieve(query: &str, docs: &[Document], k: usize) -> Vec<String> {
    rank(query, docs, k)
        .into_iter()
        .map(|(i, _)| docs[i].text.clone())
        .collect()
}
