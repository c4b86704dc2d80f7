// piiscrub-core/src/anonymizer/mod.rs
//! Applies anonymization operators to detected spans.
//!
//! The anonymizer takes the analyzer's results (or any caller-supplied spans),
//! resolves overlaps, and rewrites the text left to right. Each substitution
//! is reported with its offsets in the output text.
//!
//! License: MIT OR APACHE 2.0

pub mod operators;

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_OPERATOR_KEY;
use crate::errors::ScrubError;
use crate::pseudonymize::Pseudonymizer;
use crate::recognizer_result::{log_operator_action_debug, remove_conflicts, RecognizerResult};

pub use operators::{HashType, OperatorConfig};

/// One substitution performed by the anonymizer.
///
/// `start`/`end` are byte offsets into the anonymized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorResult {
    pub operator: String,
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// The anonymized text and the substitutions that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineResult {
    pub text: String,
    pub items: Vec<OperatorResult>,
}

/// Count of substitutions for a single entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummaryItem {
    pub entity_type: String,
    pub occurrences: usize,
}

impl EngineResult {
    /// Occurrences per entity type, ordered by entity type.
    pub fn summary(&self) -> Vec<EntitySummaryItem> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.entity_type.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(entity_type, occurrences)| EntitySummaryItem {
                entity_type: entity_type.to_string(),
                occurrences,
            })
            .collect()
    }
}

/// Stateless rewriting engine. Pseudonymization state lives in the `Pseudonymizer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymizerEngine;

impl AnonymizerEngine {
    pub fn new() -> Self {
        Self
    }

    /// Anonymizes `text` with the given per-entity operators.
    pub fn anonymize(
        &self,
        text: &str,
        results: &[RecognizerResult],
        operators: &BTreeMap<String, OperatorConfig>,
    ) -> Result<EngineResult, ScrubError> {
        self.anonymize_with(text, results, operators, None)
    }

    /// Anonymizes `text`, routing `pseudonymize` operators to `pseudonymizer`.
    ///
    /// Operator lookup: the entity's own entry, then `DEFAULT`, then replace
    /// with `<ENTITY_TYPE>`.
    pub fn anonymize_with(
        &self,
        text: &str,
        results: &[RecognizerResult],
        operators: &BTreeMap<String, OperatorConfig>,
        mut pseudonymizer: Option<&mut Pseudonymizer>,
    ) -> Result<EngineResult, ScrubError> {
        for r in results {
            let valid = r.start <= r.end
                && r.end <= text.len()
                && text.is_char_boundary(r.start)
                && text.is_char_boundary(r.end);
            if !valid {
                return Err(ScrubError::InvalidSpan { start: r.start, end: r.end, len: text.len() });
            }
        }

        let resolved = remove_conflicts(results.to_vec());
        let default_operator = OperatorConfig::default();

        let mut output = String::with_capacity(text.len());
        let mut items = Vec::with_capacity(resolved.len());
        let mut last_end = 0usize;

        for r in &resolved {
            output.push_str(&text[last_end..r.start]);
            let original = &text[r.start..r.end];

            let operator = operators
                .get(&r.entity_type)
                .or_else(|| operators.get(DEFAULT_OPERATOR_KEY))
                .unwrap_or(&default_operator);

            let replacement = match operator {
                OperatorConfig::Pseudonymize => match pseudonymizer.as_deref_mut() {
                    Some(p) => p.pseudonymize(&r.entity_type, original)?,
                    None => {
                        return Err(ScrubError::InvalidOperator(
                            r.entity_type.clone(),
                            "pseudonymize requires a Pseudonymizer with a mapping store".to_string(),
                        ))
                    }
                },
                other => other.operate(&r.entity_type, original)?,
            };
            log_operator_action_debug(module_path!(), original, &replacement, operator.name());

            let start = output.len();
            output.push_str(&replacement);
            items.push(OperatorResult {
                operator: operator.name().to_string(),
                entity_type: r.entity_type.clone(),
                start,
                end: output.len(),
                text: replacement,
            });
            last_end = r.end;
        }
        output.push_str(&text[last_end..]);

        debug!("Anonymized {} spans.", items.len());
        Ok(EngineResult { text: output, items })
    }
}
