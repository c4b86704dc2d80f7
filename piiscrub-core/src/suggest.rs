// piiscrub-core/src/suggest.rs
//! LLM-assisted discovery of custom recognizers.
//!
//! A sample text is sent to a Gemini model, which answers with candidate entity
//! types, regex patterns and context words. The answer is turned into
//! `RecognizerRule`s that can be merged into a config like any user rule.

use std::time::Duration;

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{PatternDef, RecognizerRule};
use crate::errors::ScrubError;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SuggestConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl SuggestConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Reads the API key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, ScrubError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(ScrubError::MissingApiKey(API_KEY_ENV.to_string())),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// One entity type proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedEntity {
    pub entity_name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default = "default_suggestion_score")]
    pub score: f64,
}

fn default_suggestion_score() -> f64 {
    0.5
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text and identify potential custom entities that should be detected as PII:

Text: {text}

For each entity type you identify, provide:
1. Entity name (in UPPERCASE)
2. Regular expression patterns that could match it
3. Context words that might appear around it
4. Confidence score (between 0 and 1)

Format the response as a JSON array with objects containing:
{{
    "entity_name": "ENTITY_NAME",
    "patterns": ["regex_pattern1", "regex_pattern2"],
    "context": ["context_word1", "context_word2"],
    "score": 0.8
}}"#
    )
}

/// Parses the model's answer, accepting a bare array or one wrapped in a ```json fence.
pub fn parse_suggestions(raw: &str) -> Result<Vec<SuggestedEntity>, ScrubError> {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```json").or_else(|| body.strip_prefix("```")) {
        body = rest.trim_start();
        body = body.strip_suffix("```").unwrap_or(body).trim_end();
    }
    serde_json::from_str(body).map_err(|e| ScrubError::SuggestParse(e.to_string()))
}

/// Converts suggestions into recognizer rules.
///
/// Patterns that do not compile are dropped. A suggestion left with no
/// pattern is dropped too.
pub fn suggestions_to_rules(suggestions: &[SuggestedEntity]) -> Vec<RecognizerRule> {
    let mut rules = Vec::with_capacity(suggestions.len());

    for suggestion in suggestions {
        let entity_type = suggestion.entity_name.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        if entity_type.is_empty() {
            warn!("Skipping suggestion with an empty entity name.");
            continue;
        }
        let score = if suggestion.score.is_finite() { suggestion.score.clamp(0.0, 1.0) } else { 0.5 };

        let patterns: Vec<PatternDef> = suggestion
            .patterns
            .iter()
            .enumerate()
            .filter_map(|(i, regex)| match Regex::new(regex) {
                Ok(_) => Some(PatternDef {
                    name: format!("{}_{}", entity_type.to_ascii_lowercase(), i + 1),
                    regex: regex.clone(),
                    score,
                }),
                Err(e) => {
                    warn!("Dropping invalid suggested pattern for {}: {}", entity_type, e);
                    None
                }
            })
            .collect();

        if patterns.is_empty() {
            warn!("Suggestion {} has no usable patterns; skipping.", entity_type);
            continue;
        }

        rules.push(RecognizerRule {
            name: format!("llm_{}", entity_type.to_ascii_lowercase()),
            entity_type: entity_type.clone(),
            description: Some(format!("Suggested recognizer for {}", entity_type)),
            patterns,
            context: suggestion.context.clone(),
            author: "llm-suggest".to_string(),
            tags: Some(vec!["suggested".to_string()]),
            ..Default::default()
        });
    }

    info!("Converted {} suggestions into {} rules.", suggestions.len(), rules.len());
    rules
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Blocking client for the Gemini `generateContent` endpoint.
#[derive(Debug)]
pub struct SuggestClient {
    config: SuggestConfig,
    http: reqwest::blocking::Client,
}

impl SuggestClient {
    pub fn new(config: SuggestConfig) -> Result<Self, ScrubError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScrubError::SuggestRequest(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Asks the model for recognizer suggestions for `text`.
    pub fn suggest(&self, text: &str) -> Result<Vec<SuggestedEntity>, ScrubError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(text) }] }]
        });

        debug!("Requesting recognizer suggestions from model '{}'.", self.config.model);
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| ScrubError::SuggestRequest(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(ScrubError::SuggestRequest(format!("API returned {}: {}", status, detail.trim())));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ScrubError::SuggestParse(format!("unexpected response body: {}", e.without_url())))?;

        let answer = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ScrubError::SuggestParse("response has no candidate text".to_string()))?;

        parse_suggestions(&answer)
    }
}
