//! Statistical language identification.
//!
//! Scores a small set of languages by stopword hit rate (plus a script check
//! for Arabic). An unknown result maps to English with low confidence rather
//! than failing: downstream consumers always get a language.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use docforge_core::DetectedLanguage;

struct LanguageProfile {
    code: &'static str,
    name: &'static str,
    stopwords: Lazy<HashSet<&'static str>>,
}

static PROFILES: [LanguageProfile; 4] = [
    LanguageProfile {
        code: "en",
        name: "English",
        stopwords: Lazy::new(|| {
            ["the", "and", "of", "to", "in", "is", "that", "it", "for", "was", "with", "are"]
                .into_iter()
                .collect()
        }),
    },
    LanguageProfile {
        code: "es",
        name: "Spanish",
        stopwords: Lazy::new(|| {
            ["el", "la", "de", "que", "y", "en", "los", "del", "las", "por", "con", "una"]
                .into_iter()
                .collect()
        }),
    },
    LanguageProfile {
        code: "fr",
        name: "French",
        stopwords: Lazy::new(|| {
            ["le", "la", "de", "et", "les", "des", "est", "dans", "que", "pour", "une", "sur"]
                .into_iter()
                .collect()
        }),
    },
    LanguageProfile {
        code: "de",
        name: "German",
        stopwords: Lazy::new(|| {
            ["der", "die", "und", "das", "ist", "von", "mit", "den", "für", "nicht", "ein", "eine"]
                .into_iter()
                .collect()
        }),
    },
];

const LOW_CONFIDENCE: f64 = 0.3;

pub fn detect_language(text: &str) -> DetectedLanguage {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return DetectedLanguage::new("English", "en", LOW_CONFIDENCE);
    }

    // Script check first: a predominantly Arabic-script text needs no
    // stopword statistics.
    let arabic_chars = text
        .chars()
        .filter(|c| ('\u{0600}'..='\u{06FF}').contains(c))
        .count();
    let alphabetic = text.chars().filter(|c| c.is_alphabetic()).count().max(1);
    if arabic_chars * 2 > alphabetic {
        return DetectedLanguage::new("Arabic", "ar", 0.95);
    }

    let mut best: Option<(&LanguageProfile, usize)> = None;
    for profile in &PROFILES {
        let hits = words
            .iter()
            .filter(|w| profile.stopwords.contains(w.as_str()))
            .count();
        if hits > best.map(|(_, h)| h).unwrap_or(0) {
            best = Some((profile, hits));
        }
    }

    match best {
        Some((profile, hits)) => {
            let confidence = (hits as f64 / words.len() as f64 * 4.0).min(0.99);
            DetectedLanguage::new(profile.name, profile.code, confidence)
        }
        // No stopword matched anywhere: unknown maps to English, low
        // confidence, never an error.
        None => DetectedLanguage::new("English", "en", LOW_CONFIDENCE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_english() {
        let lang = detect_language("The report is ready and it was sent to the board for review.");
        assert_eq!(lang.code, "en");
        assert!(lang.confidence > 0.3);
    }

    #[test]
    fn test_detect_spanish() {
        let lang = detect_language("El informe de la empresa fue enviado por los directores en una reunión.");
        assert_eq!(lang.code, "es");
    }

    #[test]
    fn test_detect_arabic_script() {
        let lang = detect_language("هذا النص مكتوب باللغة العربية للاختبار");
        assert_eq!(lang.code, "ar");
        assert!(lang.confidence > 0.9);
    }

    #[test]
    fn test_unknown_maps_to_english_low_confidence() {
        let lang = detect_language("zzz qqq xxx yyy");
        assert_eq!(lang.code, "en");
        assert!((lang.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_maps_to_english() {
        let lang = detect_language("");
        assert_eq!(lang.code, "en");
    }
}
