//! Regex-based entity fallback: emails, phone numbers, URLs.

use once_cell::sync::Lazy;
use regex::Regex;

use docforge_core::Entity;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\(\d{3}\)\s?|\b\d{3}[-.])\d{3}[-.]\d{4}\b").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<>()]+").unwrap());

const EMAIL_CONFIDENCE: f64 = 0.9;
const PHONE_CONFIDENCE: f64 = 0.75;
const URL_CONFIDENCE: f64 = 0.95;

/// Detect emails, phone numbers (NANP `XXX-XXX-XXXX` with optional
/// parentheses or dots), and URLs, each tagged with a fixed confidence.
pub fn extract_entities(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for m in EMAIL_RE.find_iter(text) {
        entities.push(Entity::new(m.as_str(), "Email", EMAIL_CONFIDENCE));
    }
    for m in PHONE_RE.find_iter(text) {
        entities.push(Entity::new(m.as_str(), "PhoneNumber", PHONE_CONFIDENCE));
    }
    for m in URL_RE.find_iter(text) {
        entities.push(Entity::new(m.as_str(), "Url", URL_CONFIDENCE));
    }

    entities
}
