//! Extractive summary fallback.

/// Split text into sentences on terminal punctuation, keeping non-empty
/// trimmed fragments.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Extractive summarization: the first, middle, and last sentence of the
/// text, concatenated. Short texts collapse to however many distinct
/// sentences exist.
pub fn extractive_summary(text: &str) -> String {
    let sentences = split_sentences(text);

    match sentences.len() {
        0 => String::new(),
        1 => sentences[0].clone(),
        2 => format!("{} {}", sentences[0], sentences[1]),
        n => {
            let middle = n / 2;
            format!(
                "{} {} {}",
                sentences[0],
                sentences[middle],
                sentences[n - 1]
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_middle_last() {
        let text = "One. Two. Three. Four. Five.";
        assert_eq!(extractive_summary(text), "One. Three. Five.");
    }

    #[test]
    fn test_single_sentence() {
        assert_eq!(extractive_summary("Just this one."), "Just this one.");
    }

    #[test]
    fn test_two_sentences() {
        assert_eq!(extractive_summary("First. Second."), "First. Second.");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(extractive_summary(""), "");
    }

    #[test]
    fn test_sentence_split_mixed_punctuation() {
        let sentences = split_sentences("Ready? Yes! Go.");
        assert_eq!(sentences, vec!["Ready?", "Yes!", "Go."]);
    }
}
