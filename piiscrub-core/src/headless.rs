// File: piiscrub-core/src/headless.rs

//! `headless.rs`
//! One-shot helpers that run the analyzer and anonymizer in a single call.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::analyzer::{AnalyzeRequest, AnalyzerEngine};
use crate::anonymizer::{AnonymizerEngine, EngineResult, OperatorConfig};
use crate::config::{ScrubConfig, DEFAULT_OPERATOR_KEY};
use crate::pseudonymize::Pseudonymizer;

/// Replaces every detected PII span with its `<ENTITY_TYPE>` tag.
///
/// ```rust
/// let out = piiscrub_core::sanitize_text(
///     "My name is John Doe and my phone number is 555-123-4567.",
/// )?;
/// assert_eq!(out, "My name is <PERSON> and my phone number is <PHONE_NUMBER>.");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn sanitize_text(text: &str) -> Result<String> {
    let config = ScrubConfig::load_default_rules()?;
    let result = sanitize_text_with(&config, &AnalyzeRequest::default(), text)?;
    Ok(result.text)
}

/// Analyzes and anonymizes `text` using the operators in `config`.
pub fn sanitize_text_with(config: &ScrubConfig, request: &AnalyzeRequest, text: &str) -> Result<EngineResult> {
    let analyzer = AnalyzerEngine::new(config)?;
    let results = analyzer
        .analyze(text, request)
        .context("Failed to analyze text")?;
    let anonymized = AnonymizerEngine::new()
        .anonymize(text, &results, &config.operators)
        .context("Failed to anonymize text")?;
    Ok(anonymized)
}

/// Replaces every detected span with a reversible placeholder.
///
/// The caller owns the pseudonymizer and decides when to flush its store.
pub fn pseudonymize_text(
    config: &ScrubConfig,
    request: &AnalyzeRequest,
    text: &str,
    pseudonymizer: &mut Pseudonymizer,
) -> Result<EngineResult> {
    let analyzer = AnalyzerEngine::new(config)?;
    let results = analyzer
        .analyze(text, request)
        .context("Failed to analyze text")?;

    let mut operators = BTreeMap::new();
    operators.insert(DEFAULT_OPERATOR_KEY.to_string(), OperatorConfig::Pseudonymize);

    let anonymized = AnonymizerEngine::new()
        .anonymize_with(text, &results, &operators, Some(pseudonymizer))
        .context("Failed to pseudonymize text")?;
    Ok(anonymized)
}
