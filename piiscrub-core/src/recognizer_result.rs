// piiscrub-core/src/recognizer_result.rs
//! Detection results, span conflict resolution, and PII-safe debug logging.

use std::cmp::Ordering;

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Whether raw PII may appear in debug logs. Read once from `PIISCRUB_ALLOW_DEBUG_PII`.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("PIISCRUB_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// A single detected entity. `start`/`end` are byte offsets into the analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerResult {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
    #[serde(default)]
    pub recognizer_name: String,
}

impl RecognizerResult {
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
            recognizer_name: String::new(),
        }
    }

    pub fn with_recognizer(mut self, name: impl Into<String>) -> Self {
        self.recognizer_name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &RecognizerResult) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The matched slice, if the offsets are valid for `text`.
    pub fn matched_text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

/// Resolves overlapping detections into a non-overlapping set ordered by start.
///
/// Candidates are ranked by score (descending), then span length (descending),
/// then start offset, then entity type. A candidate survives only if it does not
/// overlap an already accepted span. Empty spans are dropped.
pub fn remove_conflicts(mut results: Vec<RecognizerResult>) -> Vec<RecognizerResult> {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.entity_type.cmp(&b.entity_type))
    });

    let mut kept: Vec<RecognizerResult> = Vec::with_capacity(results.len());
    for candidate in results {
        if candidate.is_empty() {
            continue;
        }
        if let Some(winner) = kept.iter().find(|k| k.overlaps(&candidate)) {
            debug!(
                "Dropping {} [{}..{}] ({:.2}) in favour of {} [{}..{}] ({:.2})",
                candidate.entity_type, candidate.start, candidate.end, candidate.score,
                winner.entity_type, winner.start, winner.end, winner.score
            );
            continue;
        }
        kept.push(candidate);
    }

    kept.sort_by(|a, b| match a.start.cmp(&b.start) {
        Ordering::Equal => a.end.cmp(&b.end),
        other => other,
    });
    kept
}

/// Masks a sensitive value for logging.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_detection_debug(
    module_path: &str,
    recognizer_name: &str,
    entity_type: &str,
    original_sensitive_content: &str,
    score: f64,
) {
    debug!("{} Detected {} via '{}' (score {:.2}): '{}'",
        module_path,
        entity_type,
        recognizer_name,
        score,
        get_loggable_content(original_sensitive_content)
    );
}

pub fn log_rejected_match_debug(
    module_path: &str,
    recognizer_name: &str,
    original_sensitive_content: &str,
) {
    debug!("{} Validator rejected match for '{}': '{}'",
        module_path,
        recognizer_name,
        get_loggable_content(original_sensitive_content)
    );
}

pub fn log_operator_action_debug(
    module_path: &str,
    original_sensitive_content: &str,
    replacement: &str,
    operator: &str,
) {
    debug!(
        "{} Operator '{}': Original='{}', Replacement='{}'",
        module_path,
        operator,
        get_loggable_content(original_sensitive_content),
        replacement
    );
}
