// piiscrub-core/src/recognizers/pattern.rs
//! A `Recognizer` implementation driven by compiled regex rules.
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use piiscrub_context::{enhance_score, ContextWeights};

use crate::recognizer::Recognizer;
use crate::recognizer_result::{log_detection_debug, log_rejected_match_debug, RecognizerResult};
use crate::recognizers::compiler::CompiledRecognizer;

/// Runs one compiled rule: regex patterns, validator, deny list, then context enhancement.
#[derive(Debug)]
pub struct PatternRecognizer {
    compiled: Arc<CompiledRecognizer>,
    context_window: usize,
    weights: ContextWeights,
}

impl PatternRecognizer {
    pub fn new(compiled: Arc<CompiledRecognizer>, context_window: usize, weights: ContextWeights) -> Self {
        Self { compiled, context_window, weights }
    }

    fn build_result(&self, text: &str, start: usize, end: usize, base_score: f64) -> RecognizerResult {
        let has_context = self.compiled.context.has_context(text.as_bytes(), start, end, self.context_window);
        let score = enhance_score(base_score, has_context, &self.weights);
        log_detection_debug(
            module_path!(),
            &self.compiled.name,
            &self.compiled.entity_type,
            &text[start..end],
            score,
        );
        RecognizerResult::new(self.compiled.entity_type.clone(), start, end, score)
            .with_recognizer(self.compiled.name.clone())
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.compiled.name
    }

    fn supported_entities(&self) -> Vec<String> {
        vec![self.compiled.entity_type.clone()]
    }

    fn supported_language(&self) -> &str {
        &self.compiled.language
    }

    fn analyze(&self, text: &str, entities: &[String]) -> Vec<RecognizerResult> {
        if !entities.contains(&self.compiled.entity_type) {
            return Vec::new();
        }

        let mut results = Vec::new();

        for pattern in &self.compiled.patterns {
            for m in pattern.regex.find_iter(text) {
                if m.start() == m.end() {
                    continue;
                }
                let mut score = pattern.score;
                if let Some(validate) = self.compiled.validator {
                    if !validate(m.as_str()) {
                        log_rejected_match_debug(module_path!(), &self.compiled.name, m.as_str());
                        continue;
                    }
                    if let Some(valid_score) = self.compiled.score_on_valid {
                        score = valid_score;
                    }
                }
                results.push(self.build_result(text, m.start(), m.end(), score));
            }
        }

        if let Some(deny) = &self.compiled.deny_list {
            for m in deny.find_iter(text) {
                results.push(self.build_result(text, m.start(), m.end(), self.compiled.deny_list_score));
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternDef, RecognizerRule};
    use crate::recognizers::compiler::compile_rules;

    fn recognizer(rule: RecognizerRule) -> PatternRecognizer {
        let compiled = compile_rules(vec![rule]).unwrap();
        PatternRecognizer::new(Arc::clone(&compiled.recognizers[0]), 48, ContextWeights::default())
    }

    fn entities(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn validator_filters_and_rescores() {
        let r = recognizer(RecognizerRule {
            name: "card".into(),
            entity_type: "CREDIT_CARD".into(),
            patterns: vec![PatternDef { name: "digits".into(), regex: r"\b(?:\d[ -]?){12,18}\d\b".into(), score: 0.3 }],
            validator: Some("luhn".into()),
            score_on_valid: Some(1.0),
            ..Default::default()
        });
        let text = "good 4111-1111-1111-1111 bad 4111-1111-1111-1112";
        let results = r.analyze(text, &entities(&["CREDIT_CARD"]));
        assert_eq!(results.len(), 1);
        assert_eq!(&text[results[0].start..results[0].end], "4111-1111-1111-1111");
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[0].recognizer_name, "card");
    }

    #[test]
    fn context_raises_score() {
        let r = recognizer(RecognizerRule {
            name: "zip".into(),
            entity_type: "ZIP".into(),
            patterns: vec![PatternDef { name: "five".into(), regex: r"\b\d{5}\b".into(), score: 0.1 }],
            context: vec!["zip".into()],
            ..Default::default()
        });
        let with = r.analyze("zip code 90210", &entities(&["ZIP"]));
        let without = r.analyze("order 90210", &entities(&["ZIP"]));
        assert!((with[0].score - 0.45).abs() < 1e-9);
        assert!((without[0].score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn deny_list_matches_whole_words() {
        let r = recognizer(RecognizerRule {
            name: "org".into(),
            entity_type: "ORGANIZATION".into(),
            deny_list: vec!["Acme".into()],
            case_insensitive: true,
            ..Default::default()
        });
        let results = r.analyze("ACME sells to Acmeology", &entities(&["ORGANIZATION"]));
        assert_eq!(results.len(), 1);
        assert_eq!((results[0].start, results[0].end), (0, 4));
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn ignores_unrequested_entities() {
        let r = recognizer(RecognizerRule {
            name: "org".into(),
            entity_type: "ORGANIZATION".into(),
            deny_list: vec!["Acme".into()],
            ..Default::default()
        });
        assert!(r.analyze("Acme", &entities(&["PERSON"])).is_empty());
    }
}
