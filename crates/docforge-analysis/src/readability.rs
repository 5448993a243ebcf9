//! Flesch reading-ease readability score.

use crate::summary::split_sentences;

/// Syllable heuristic: count vowel clusters, minimum 1 per word.
pub fn count_syllables(word: &str) -> usize {
    let mut count = 0;
    let mut in_cluster = false;

    for c in word.to_lowercase().chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !in_cluster {
            count += 1;
        }
        in_cluster = is_vowel;
    }

    count.max(1)
}

/// Flesch reading ease over sentence count, word count, and the syllable
/// heuristic, clamped to [0, 100].
pub fn readability_score(text: &str) -> f64 {
    let sentences = split_sentences(text).len().max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;

    let score = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllable_counts() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("readability"), 5);
        // Heuristic floor: every word has at least one syllable.
        assert_eq!(count_syllables("tsk"), 1);
    }

    #[test]
    fn test_simple_text_scores_high() {
        let score = readability_score("The cat sat. The dog ran. It was fun.");
        assert!(score > 80.0, "got {}", score);
    }

    #[test]
    fn test_dense_text_scores_lower() {
        let dense = "Institutional sustainability considerations necessitate comprehensive \
                     organizational restructuring initiatives alongside multidimensional \
                     stakeholder engagement paradigms.";
        let simple_score = readability_score("The cat sat on the mat.");
        let dense_score = readability_score(dense);
        assert!(dense_score < simple_score);
    }

    #[test]
    fn test_score_clamped() {
        let score = readability_score("antidisestablishmentarianism incomprehensibilities");
        assert!((0.0..=100.0).contains(&score));
        assert!(readability_score("") >= 0.0);
    }
}
