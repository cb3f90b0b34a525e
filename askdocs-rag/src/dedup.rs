//! Near-duplicate compression of search results.
//!
//! Overlapping chunks from the same document often surface nearly identical
//! text for one query. [`compress`] walks results in rank order and drops any
//! entry whose text is an exact match or a near-duplicate (Jaccard similarity
//! of lowercased word sets at or above the threshold) of an already-kept
//! entry, keeping the first occurrence.

use std::collections::HashSet;

use crate::document::SearchResult;

/// Drop near-duplicate results, preserving the rank order of first occurrences.
pub fn compress(results: Vec<SearchResult>, threshold: f64) -> Vec<SearchResult> {
    let mut kept: Vec<SearchResult> = Vec::with_capacity(results.len());
    let mut kept_words: Vec<HashSet<String>> = Vec::with_capacity(results.len());

    for result in results {
        let words = word_set(&result.chunk.text);
        let duplicate = kept.iter().zip(&kept_words).any(|(existing, existing_words)| {
            existing.chunk.text == result.chunk.text
                || jaccard(existing_words, &words) >= threshold
        });
        if !duplicate {
            kept.push(result);
            kept_words.push(words);
        }
    }

    kept
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity of two word sets. Two empty sets count as identical.
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use uuid::Uuid;

    use super::*;
    use crate::document::Chunk;

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                filename: "a.txt".to_string(),
                sequence_index: 0,
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
            },
            score,
        }
    }

    #[test]
    fn exact_duplicates_collapse_to_first() {
        let results =
            vec![result("the quick brown fox", 0.9), result("the quick brown fox", 0.8)];
        let kept = compress(results, 0.9);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn near_duplicates_above_threshold_collapse() {
        // 19 shared words out of 20 distinct: jaccard 0.9.
        let base: Vec<String> = (0..19).map(|i| format!("word{i}")).collect();
        let a = format!("{} alpha", base.join(" "));
        let b = format!("{} beta", base.join(" "));
        let kept = compress(vec![result(&a, 0.9), result(&b, 0.8)], 0.9);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chunk.text, a);
    }

    #[test]
    fn distinct_texts_survive_in_rank_order() {
        let results = vec![
            result("rust ownership rules", 0.9),
            result("tokio task scheduling", 0.7),
            result("axum request extractors", 0.5),
        ];
        let kept = compress(results, 0.9);
        assert_eq!(kept.len(), 3);
        assert!(kept.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
