//! Lexicon-based sentiment fallback.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use docforge_core::{Sentiment, SentimentLabel, SentimentScores};

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "good", "great", "excellent", "amazing", "wonderful", "fantastic", "positive",
        "success", "successful", "happy", "love", "loved", "best", "better", "improved",
        "improvement", "efficient", "effective", "valuable", "benefit", "beneficial",
        "outstanding", "superb", "impressive", "delighted", "pleased", "gain", "growth",
        "strong", "win", "winning",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bad", "poor", "terrible", "awful", "horrible", "negative", "failure", "failed",
        "worst", "worse", "sad", "hate", "hated", "problem", "problems", "issue", "issues",
        "broken", "loss", "losses", "weak", "decline", "declining", "inefficient", "defect",
        "defective", "disappointing", "disappointed", "error", "errors", "risk",
    ]
    .into_iter()
    .collect()
});

/// Polarity count over the fixed lexicons.
///
/// Score is the class fraction of matched sentiment words; ties and the
/// no-match case resolve to neutral with an even distribution.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for token in text.split_whitespace() {
        let word: String = token
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect::<String>()
            .to_lowercase();
        if POSITIVE_WORDS.contains(word.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(word.as_str()) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 || positive == negative {
        return Sentiment {
            label: SentimentLabel::Neutral,
            scores: SentimentScores::even(),
        };
    }

    let scores = SentimentScores {
        positive: positive as f64 / total as f64,
        negative: negative as f64 / total as f64,
        neutral: 0.0,
    };

    let label = if positive > negative {
        SentimentLabel::Positive
    } else {
        SentimentLabel::Negative
    };

    Sentiment { label, scores }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_positive_hits_classify_positive() {
        let sentiment = analyze_sentiment("The results were great and the team did an excellent job.");
        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert!((sentiment.scores.positive - 1.0).abs() < 1e-9);
        assert_eq!(sentiment.scores.negative, 0.0);
    }

    #[test]
    fn test_negative_majority() {
        let sentiment = analyze_sentiment("terrible awful results, one good part");
        assert_eq!(sentiment.label, SentimentLabel::Negative);
        assert!(sentiment.scores.negative > sentiment.scores.positive);
    }

    #[test]
    fn test_no_match_is_neutral_even() {
        let sentiment = analyze_sentiment("the quarterly figures are attached below");
        assert_eq!(sentiment.label, SentimentLabel::Neutral);
        assert!((sentiment.scores.sum() - 1.0).abs() < 1e-9);
        assert!((sentiment.scores.positive - sentiment.scores.negative).abs() < 1e-9);
    }

    #[test]
    fn test_tie_is_neutral() {
        let sentiment = analyze_sentiment("good bad");
        assert_eq!(sentiment.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_punctuation_and_case_ignored() {
        let sentiment = analyze_sentiment("Great! Excellent.");
        assert_eq!(sentiment.label, SentimentLabel::Positive);
    }
}
