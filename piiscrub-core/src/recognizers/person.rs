// piiscrub-core/src/recognizers/person.rs
//! Rule-based person name recognizer.
//!
//! There is no statistical model here. A name is a run of capitalized tokens
//! that follows a cue ("my name is", "Dear", "Mr.", "Customer:"), or a
//! first-name / middle-initial / last-name triple anywhere in the text.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::recognizer::Recognizer;
use crate::recognizer_result::{log_detection_debug, RecognizerResult};

pub const PERSON_ENTITY: &str = "PERSON";
const RECOGNIZER_NAME: &str = "PersonRecognizer";
const MAX_NAME_TOKENS: usize = 4;
const CUED_SCORE: f64 = 0.85;
const INITIAL_PATTERN_SCORE: f64 = 0.6;

static CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:my\s+)?name\s+is|named|i\s+am|i'm|this\s+is|dear|contact(?:\s*:)?|(?:customer|client|patient|employee|full\s+name|name)\s*:|(?-i:Mr|Mrs|Ms|Miss|Dr|Prof)\.?)[ \t]+",
    )
    .expect("person cue regex is valid")
});

static NAME_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\p{Lu}\.|\p{Lu}[\p{L}'’-]*)").expect("name token regex is valid")
});

static FIRST_INITIAL_LAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\p{Lu}\p{Ll}+[ \t]+\p{Lu}\.[ \t]+\p{Lu}\p{Ll}+\b").expect("initial name regex is valid")
});

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend([
        "The", "And", "Or", "But", "My", "Our", "Your", "His", "Her", "Their", "This", "That",
        "We", "You", "He", "She", "They", "It", "Is", "Was", "From", "To", "On", "In", "At",
        "For", "With", "Please", "Thanks", "Thank", "Hello", "Hi", "Phone", "Email", "Website",
        "Issue", "Address",
    ]);
    set
});

/// Detects `PERSON` entities with cue phrases and capitalization rules.
#[derive(Debug, Default)]
pub struct PersonRecognizer;

impl PersonRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Reads a run of capitalized tokens starting at byte `from`.
    /// Returns the byte span of the run, without trailing initials.
    fn capture_name_run(text: &str, from: usize) -> Option<(usize, usize)> {
        let mut pos = from;
        // (start, end, is_initial)
        let mut tokens: Vec<(usize, usize, bool)> = Vec::with_capacity(MAX_NAME_TOKENS);

        while tokens.len() < MAX_NAME_TOKENS {
            let Some(m) = NAME_TOKEN.find(&text[pos..]) else { break; };
            let word = m.as_str();
            let is_initial = word.ends_with('.');
            if !is_initial && (word.chars().count() < 2 || STOP_WORDS.contains(word)) {
                break;
            }
            tokens.push((pos + m.start(), pos + m.end(), is_initial));

            let after = pos + m.end();
            let gap = text[after..].bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
            if gap == 0 {
                break;
            }
            pos = after + gap;
        }

        while matches!(tokens.last(), Some((_, _, true))) {
            tokens.pop();
        }
        let (first, last) = (tokens.first()?, tokens.last()?);
        Some((first.0, last.1))
    }
}

impl Recognizer for PersonRecognizer {
    fn name(&self) -> &str {
        RECOGNIZER_NAME
    }

    fn supported_entities(&self) -> Vec<String> {
        vec![PERSON_ENTITY.to_string()]
    }

    fn analyze(&self, text: &str, entities: &[String]) -> Vec<RecognizerResult> {
        if !entities.iter().any(|e| e == PERSON_ENTITY) {
            return Vec::new();
        }

        let mut results = Vec::new();

        for cue in CUE.find_iter(text) {
            if let Some((start, end)) = Self::capture_name_run(text, cue.end()) {
                log_detection_debug(module_path!(), RECOGNIZER_NAME, PERSON_ENTITY, &text[start..end], CUED_SCORE);
                results.push(
                    RecognizerResult::new(PERSON_ENTITY, start, end, CUED_SCORE).with_recognizer(RECOGNIZER_NAME),
                );
            }
        }

        for m in FIRST_INITIAL_LAST.find_iter(text) {
            log_detection_debug(module_path!(), RECOGNIZER_NAME, PERSON_ENTITY, m.as_str(), INITIAL_PATTERN_SCORE);
            results.push(
                RecognizerResult::new(PERSON_ENTITY, m.start(), m.end(), INITIAL_PATTERN_SCORE)
                    .with_recognizer(RECOGNIZER_NAME),
            );
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        let entities = vec![PERSON_ENTITY.to_string()];
        let mut found: Vec<String> = PersonRecognizer::new()
            .analyze(text, &entities)
            .into_iter()
            .map(|r| text[r.start..r.end].to_string())
            .collect();
        found.dedup();
        found
    }

    #[test]
    fn cue_phrase_introduces_name() {
        assert_eq!(names("My name is John Doe and my phone number is 555-123-4567."), vec!["John Doe"]);
    }

    #[test]
    fn label_and_title_cues() {
        assert_eq!(names("Customer: John Doe\nPhone: 555-123-4567"), vec!["John Doe"]);
        assert_eq!(names("Please ask Dr. Watson."), vec!["Watson"]);
    }

    #[test]
    fn contact_cue_with_and_without_colon() {
        assert_eq!(names("Please contact John Smith tomorrow."), vec!["John Smith"]);
        assert_eq!(names("Contact: Jane Roe"), vec!["Jane Roe"]);
        assert!(names("contact number +1 555 123 4567").is_empty());
    }

    #[test]
    fn titles_are_case_sensitive() {
        assert!(names("I miss Paris.").is_empty());
        assert!(names("the dr Watson line").is_empty());
        assert_eq!(names("Letter for Miss Marple"), vec!["Marple"]);
        assert_eq!(names("Seen by Mrs Hudson"), vec!["Hudson"]);
    }

    #[test]
    fn middle_initial_kept_inside_run() {
        assert_eq!(names("an individual named John A. Doe."), vec!["John A. Doe"]);
        assert_eq!(names("On Monday, Emily J. Carter submitted a complaint"), vec!["Emily J. Carter"]);
    }

    #[test]
    fn stop_words_and_lowercase_end_runs() {
        assert!(names("this is the end").is_empty());
        assert!(names("I am The best").is_empty());
        assert_eq!(names("Dear Anna, thanks"), vec!["Anna"]);
    }

    #[test]
    fn skipped_when_not_requested() {
        let out = PersonRecognizer::new().analyze("My name is John Doe", &["EMAIL_ADDRESS".to_string()]);
        assert!(out.is_empty());
    }
}
