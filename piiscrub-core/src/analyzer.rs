// piiscrub-core/src/analyzer.rs
//! The analyzer: runs every registered recognizer over a text and returns a
//! non-overlapping, score-filtered list of detected entities.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisSettings, ScrubConfig, DEFAULT_LANGUAGE};
use crate::errors::ScrubError;
use crate::recognizer::Recognizer;
use crate::recognizer_result::{remove_conflicts, RecognizerResult};
use crate::recognizers::compiler::get_or_compile_rules;
use crate::recognizers::{PatternRecognizer, PersonRecognizer};

/// Parameters for a single `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub language: String,
    /// Restrict detection to these entity types. `None` means all supported.
    pub entities: Option<Vec<String>>,
    /// Overrides the configured threshold when set.
    pub score_threshold: Option<f64>,
    /// Matched values that are never reported.
    pub allow_list: Vec<String>,
}

impl Default for AnalyzeRequest {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            entities: None,
            score_threshold: None,
            allow_list: Vec::new(),
        }
    }
}

impl AnalyzeRequest {
    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_allow_list(mut self, allow_list: Vec<String>) -> Self {
        self.allow_list = allow_list;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Holds the recognizer registry and analysis settings.
#[derive(Debug)]
pub struct AnalyzerEngine {
    recognizers: Vec<Arc<dyn Recognizer>>,
    settings: AnalysisSettings,
}

impl AnalyzerEngine {
    /// Builds an analyzer from a config: every active pattern rule, plus the
    /// person recognizer unless it is switched off.
    pub fn new(config: &ScrubConfig) -> Result<Self> {
        let compiled = get_or_compile_rules(config)
            .context("Failed to compile recognizer rules for AnalyzerEngine")?;
        let settings = config.analysis.clone();
        let window = settings.context_window();
        let weights = settings.context_weights();

        let mut recognizers: Vec<Arc<dyn Recognizer>> = compiled
            .recognizers
            .iter()
            .map(|c| Arc::new(PatternRecognizer::new(Arc::clone(c), window, weights)) as Arc<dyn Recognizer>)
            .collect();

        if settings.person_recognizer_enabled() {
            recognizers.push(Arc::new(PersonRecognizer::new()));
        }

        info!("AnalyzerEngine ready with {} recognizers.", recognizers.len());
        Ok(Self { recognizers, settings })
    }

    /// An analyzer over the built-in recognizers.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ScrubConfig::load_default_rules()?)
    }

    /// Registers an additional recognizer.
    pub fn add_recognizer(&mut self, recognizer: Box<dyn Recognizer>) {
        debug!("Registering recognizer '{}'.", recognizer.name());
        self.recognizers.push(Arc::from(recognizer));
    }

    pub fn recognizers(&self) -> &[Arc<dyn Recognizer>] {
        &self.recognizers
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Every entity type some recognizer can emit, sorted.
    pub fn supported_entities(&self) -> Vec<String> {
        self.recognizers
            .iter()
            .flat_map(|r| r.supported_entities())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.recognizers
            .iter()
            .map(|r| r.supported_language().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Detects entities in `text`.
    ///
    /// Fails when the language has no recognizers, or when the entity filter
    /// names a type nothing can produce. Empty text yields no results.
    pub fn analyze(&self, text: &str, request: &AnalyzeRequest) -> Result<Vec<RecognizerResult>, ScrubError> {
        let language_recognizers: Vec<&Arc<dyn Recognizer>> = self
            .recognizers
            .iter()
            .filter(|r| r.supported_language() == request.language)
            .collect();

        if language_recognizers.is_empty() {
            return Err(ScrubError::UnsupportedLanguage(
                request.language.clone(),
                self.supported_languages().join(", "),
            ));
        }

        let supported: BTreeSet<String> = language_recognizers
            .iter()
            .flat_map(|r| r.supported_entities())
            .collect();

        let entities: Vec<String> = match &request.entities {
            Some(requested) => {
                if let Some(unknown) = requested.iter().find(|e| !supported.contains(*e)) {
                    return Err(ScrubError::UnknownEntity(unknown.clone()));
                }
                requested.clone()
            }
            None => supported.into_iter().collect(),
        };

        if text.is_empty() || entities.is_empty() {
            return Ok(Vec::new());
        }

        let threshold = request.score_threshold.unwrap_or_else(|| self.settings.score_threshold());

        let mut raw: Vec<RecognizerResult> = Vec::new();
        for recognizer in language_recognizers {
            if !recognizer.wants_any(&entities) {
                continue;
            }
            raw.extend(recognizer.analyze(text, &entities));
        }
        let raw_count = raw.len();

        raw.retain(|r| {
            r.score >= threshold
                && r.matched_text(text)
                    .map_or(false, |matched| !request.allow_list.iter().any(|allowed| allowed == matched))
        });

        let results = remove_conflicts(raw);
        debug!(
            "Analysis complete: {} raw detections, {} after threshold/allow-list/conflict resolution.",
            raw_count,
            results.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> AnalyzerEngine {
        AnalyzerEngine::with_defaults().unwrap()
    }

    fn found(text: &str, results: &[RecognizerResult]) -> Vec<(String, String)> {
        results
            .iter()
            .map(|r| (r.entity_type.clone(), text[r.start..r.end].to_string()))
            .collect()
    }

    #[test]
    fn detects_readme_example() {
        let text = "My name is John Doe and my phone number is 555-123-4567.";
        let results = analyzer().analyze(text, &AnalyzeRequest::default()).unwrap();
        assert_eq!(
            found(text, &results),
            vec![
                ("PERSON".to_string(), "John Doe".to_string()),
                ("PHONE_NUMBER".to_string(), "555-123-4567".to_string()),
            ]
        );
    }

    #[test]
    fn empty_text_has_no_results() {
        assert!(analyzer().analyze("", &AnalyzeRequest::default()).unwrap().is_empty());
    }

    #[test]
    fn unsupported_language_is_an_error() {
        let err = analyzer()
            .analyze("hola", &AnalyzeRequest::default().with_language("es"))
            .unwrap_err();
        assert!(matches!(err, ScrubError::UnsupportedLanguage(ref l, _) if l == "es"));
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let err = analyzer()
            .analyze("text", &AnalyzeRequest::default().with_entities(vec!["SPACESHIP".into()]))
            .unwrap_err();
        assert!(matches!(err, ScrubError::UnknownEntity(ref e) if e == "SPACESHIP"));
    }

    #[test]
    fn entity_filter_threshold_and_allow_list() {
        let text = "Mail j.doe@example.com or ops@example.com, call 555-123-4567.";
        let request = AnalyzeRequest::default()
            .with_entities(vec!["EMAIL_ADDRESS".into()])
            .with_allow_list(vec!["ops@example.com".into()]);
        let results = analyzer().analyze(text, &request).unwrap();
        assert_eq!(found(text, &results), vec![("EMAIL_ADDRESS".to_string(), "j.doe@example.com".to_string())]);

        let strict = AnalyzeRequest::default().with_score_threshold(0.99);
        let results = analyzer().analyze("call 555-123-4567", &strict).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn card_beats_overlapping_weaker_matches() {
        let text = "Paid with 4111-1111-1111-1111 yesterday";
        let results = analyzer().analyze(text, &AnalyzeRequest::default()).unwrap();
        assert_eq!(found(text, &results), vec![("CREDIT_CARD".to_string(), "4111-1111-1111-1111".to_string())]);
    }

    #[test]
    fn custom_recognizer_can_be_registered() {
        #[derive(Debug)]
        struct Ticket;
        impl Recognizer for Ticket {
            fn name(&self) -> &str { "ticket" }
            fn supported_entities(&self) -> Vec<String> { vec!["TICKET".into()] }
            fn analyze(&self, text: &str, _entities: &[String]) -> Vec<RecognizerResult> {
                text.find("TCK-1").map(|i| RecognizerResult::new("TICKET", i, i + 5, 0.9)).into_iter().collect()
            }
        }
        let mut engine = analyzer();
        engine.add_recognizer(Box::new(Ticket));
        assert!(engine.supported_entities().contains(&"TICKET".to_string()));
        let results = engine
            .analyze("see TCK-1", &AnalyzeRequest::default().with_entities(vec!["TICKET".into()]))
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
