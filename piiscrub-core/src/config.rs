//! Configuration management for `piiscrub-core`.
//!
//! This module defines the core data structures for recognizer rules, anonymization
//! operators and analysis settings. It handles YAML (de)serialization and provides
//! utilities for loading, merging, filtering and validating these configs.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;
use log::{debug, info, warn};
use regex::Regex;

use crate::anonymizer::operators::OperatorConfig;
use crate::validators;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Operator key that applies to every entity without its own entry.
pub const DEFAULT_OPERATOR_KEY: &str = "DEFAULT";

/// The only language the built-in recognizers ship for.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default size, in bytes, of the window searched for context words.
pub const DEFAULT_CONTEXT_WINDOW: usize = 48;

/// A single regex within a recognizer, with the base score its matches receive.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternDef {
    pub name: String,
    pub regex: String,
    pub score: f64,
}

impl Default for PatternDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            regex: String::new(),
            score: 0.5,
        }
    }
}

impl Hash for PatternDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.regex.hash(state);
        self.score.to_bits().hash(state);
    }
}

/// Represents a single pattern-based recognizer definition.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecognizerRule {
    /// Unique identifier for the rule (e.g., "email_address").
    pub name: String,
    /// The entity this rule detects (e.g., "EMAIL_ADDRESS").
    pub entity_type: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// Regex patterns, each with its own base score.
    pub patterns: Vec<PatternDef>,
    /// Exact terms that are always reported as this entity.
    pub deny_list: Vec<String>,
    /// Score for deny-list hits.
    pub deny_list_score: f64,
    /// Words that raise confidence when found near a match.
    pub context: Vec<String>,
    /// Name of a programmatic validator (see `validators::lookup`).
    pub validator: Option<String>,
    /// Score assigned to matches that pass the validator. `None` keeps the pattern score.
    pub score_on_valid: Option<f64>,
    /// Language of the text this rule is written for.
    pub language: String,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
    /// If true, the rule is disabled unless explicitly enabled.
    pub opt_in: bool,
    /// If true, `^`/`$` match at line boundaries.
    pub multiline: bool,
    /// If true, patterns and deny-list terms ignore case.
    pub case_insensitive: bool,
    pub version: String,
    pub author: String,
    /// Metadata tags for categorization.
    pub tags: Option<Vec<String>>,
}

impl Hash for RecognizerRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.entity_type.hash(state);
        self.patterns.hash(state);
        self.deny_list.hash(state);
        self.deny_list_score.to_bits().hash(state);
        self.context.hash(state);
        self.validator.hash(state);
        self.score_on_valid.map(f64::to_bits).hash(state);
        self.language.hash(state);
        self.enabled.hash(state);
        self.opt_in.hash(state);
        self.multiline.hash(state);
        self.case_insensitive.hash(state);
    }
}

impl Default for RecognizerRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            entity_type: String::new(),
            description: None,
            patterns: Vec::new(),
            deny_list: Vec::new(),
            deny_list_score: 1.0,
            context: Vec::new(),
            validator: None,
            score_on_valid: None,
            language: DEFAULT_LANGUAGE.to_string(),
            enabled: None,
            opt_in: false,
            multiline: false,
            case_insensitive: false,
            version: "1.0.0".to_string(),
            author: "Relay Team".to_string(),
            tags: None,
        }
    }
}

impl RecognizerRule {
    /// A rule runs unless it is explicitly disabled, or it is opt-in and not explicitly enabled.
    pub fn is_active(&self) -> bool {
        match self.enabled {
            Some(enabled) => enabled,
            None => !self.opt_in,
        }
    }
}

/// Tuning knobs for the analyzer.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Results scoring below this are dropped (default: 0.0).
    pub score_threshold: Option<f64>,
    /// Bytes searched on each side of a match for context words.
    pub context_window: Option<usize>,
    /// Score added when context is present (default: 0.35).
    pub context_boost: Option<f64>,
    /// Floor for scores that had context (default: 0.4).
    pub min_score_with_context: Option<f64>,
    /// Whether the rule-based person name recognizer runs (default: true).
    pub person_recognizer: Option<bool>,
}

impl AnalysisSettings {
    pub fn score_threshold(&self) -> f64 {
        self.score_threshold.unwrap_or(0.0)
    }

    pub fn context_window(&self) -> usize {
        self.context_window.unwrap_or(DEFAULT_CONTEXT_WINDOW)
    }

    pub fn context_weights(&self) -> piiscrub_context::ContextWeights {
        let defaults = piiscrub_context::ContextWeights::default();
        piiscrub_context::ContextWeights {
            boost: self.context_boost.unwrap_or(defaults.boost),
            min_score_with_context: self.min_score_with_context.unwrap_or(defaults.min_score_with_context),
        }
    }

    pub fn person_recognizer_enabled(&self) -> bool {
        self.person_recognizer.unwrap_or(true)
    }
}

/// Represents the top-level configuration structure for piiscrub.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScrubConfig {
    /// Pattern-based recognizer definitions.
    #[serde(default)]
    pub rules: Vec<RecognizerRule>,
    /// Anonymization operator per entity type; `DEFAULT` covers the rest.
    #[serde(default)]
    pub operators: BTreeMap<String, OperatorConfig>,
    /// Analyzer settings (thresholds and context weights).
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl ScrubConfig {
    /// Loads recognizer rules from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom recognizers from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ScrubConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded {} recognizers from file {}.", config.rules.len(), path.display());

        Ok(config)
    }

    /// Loads the built-in recognizers from the embedded configuration.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default recognizers from embedded string...");
        let default_yaml = include_str!("../config/default_recognizers.yaml");
        let config: ScrubConfig = serde_yml::from_str(default_yaml)
            .context("Failed to parse default recognizers")?;

        debug!("Loaded {} default recognizers.", config.rules.len());
        Ok(config)
    }

    /// Checks rule integrity and operator settings, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = validate_rules(&self.rules);

        for (entity, operator) in &self.operators {
            if let Err(e) = operator.validate() {
                errors.push(format!("Operator for '{}' is invalid: {}", entity, e));
            }
        }

        if let Some(threshold) = self.analysis.score_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                errors.push(format!("analysis.score_threshold {} is outside [0, 1].", threshold));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Config validation failed:\n{}", errors.join("\n")))
        }
    }

    /// Filters active rules based on enable/disable lists provided via CLI or policy.
    ///
    /// Disabled rules are removed. Opt-in rules survive only when enabled.
    pub fn set_active_rules(&mut self, enable_rules: &[String], disable_rules: &[String]) {
        let enable_set: HashSet<&str> = enable_rules.iter().map(String::as_str).collect();
        let disable_set: HashSet<&str> = disable_rules.iter().map(String::as_str).collect();

        debug!("Initial rules count before filtering: {}", self.rules.len());

        let all_rule_names: HashSet<&str> = self.rules.iter().map(|r| r.name.as_str()).collect();

        for rule_name in enable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `enable_rules` list does not exist.", rule_name);
        }

        for rule_name in disable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `disable_rules` list does not exist.", rule_name);
        }

        for rule in self.rules.iter_mut() {
            if enable_set.contains(rule.name.as_str()) {
                rule.enabled = Some(true);
            }
        }

        self.rules.retain(|rule| {
            !disable_set.contains(rule.name.as_str()) && rule.is_active()
        });

        debug!("Final active rules count after filtering: {}", self.rules.len());
    }

    /// The operator configured for an entity, falling back to `DEFAULT`.
    pub fn operator_for(&self, entity_type: &str) -> Option<&OperatorConfig> {
        self.operators
            .get(entity_type)
            .or_else(|| self.operators.get(DEFAULT_OPERATOR_KEY))
    }
}

/// Merges user-defined rules, operators and analysis settings with defaults.
///
/// Same-named user rules replace defaults. The merged rule list is ordered by name.
pub fn merge_rules(
    default_config: ScrubConfig,
    user_config: Option<ScrubConfig>,
) -> ScrubConfig {
    debug!("merge_rules called. Initial default rules count: {}", default_config.rules.len());

    let mut final_rules_map: BTreeMap<String, RecognizerRule> = default_config.rules.into_iter()
        .map(|rule| (rule.name.clone(), rule))
        .collect();
    let mut final_operators = default_config.operators;
    let mut final_analysis = default_config.analysis;

    if let Some(user_cfg) = user_config {
        debug!("User config provided. Merging {} user rules.", user_cfg.rules.len());
        for user_rule in user_cfg.rules {
            final_rules_map.insert(user_rule.name.clone(), user_rule);
        }

        final_operators.extend(user_cfg.operators);

        let user_analysis = user_cfg.analysis;
        if let Some(threshold) = user_analysis.score_threshold {
            debug!("Overriding score threshold with user value: {}", threshold);
            final_analysis.score_threshold = Some(threshold);
        }
        if let Some(window) = user_analysis.context_window {
            final_analysis.context_window = Some(window);
        }
        if let Some(boost) = user_analysis.context_boost {
            final_analysis.context_boost = Some(boost);
        }
        if let Some(floor) = user_analysis.min_score_with_context {
            final_analysis.min_score_with_context = Some(floor);
        }
        if let Some(person) = user_analysis.person_recognizer {
            final_analysis.person_recognizer = Some(person);
        }
    }

    let final_rules: Vec<RecognizerRule> = final_rules_map.into_values().collect();
    debug!("Final total rules after merge: {}", final_rules.len());

    ScrubConfig {
        rules: final_rules,
        operators: final_operators,
        analysis: final_analysis,
    }
}

/// Validates rule integrity: names, entity types, regex compilation, scores and validators.
fn validate_rules(rules: &[RecognizerRule]) -> Vec<String> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        if rule.entity_type.trim().is_empty() {
            errors.push(format!("Rule '{}' has an empty `entity_type` field.", rule.name));
        }

        if rule.patterns.is_empty() && rule.deny_list.is_empty() {
            errors.push(format!("Rule '{}' needs at least one pattern or deny_list term.", rule.name));
        }

        for pattern in &rule.patterns {
            if pattern.regex.is_empty() {
                errors.push(format!("Rule '{}' has an empty pattern '{}'.", rule.name, pattern.name));
                continue;
            }
            if pattern.regex.len() > MAX_PATTERN_LENGTH {
                errors.push(format!(
                    "Rule '{}': pattern '{}' length ({}) exceeds maximum allowed ({}).",
                    rule.name, pattern.name, pattern.regex.len(), MAX_PATTERN_LENGTH
                ));
                continue;
            }
            if let Err(e) = Regex::new(&pattern.regex) {
                errors.push(format!("Rule '{}' has an invalid regex pattern '{}': {}", rule.name, pattern.name, e));
            }
            if !(0.0..=1.0).contains(&pattern.score) {
                errors.push(format!("Rule '{}': pattern '{}' score {} is outside [0, 1].", rule.name, pattern.name, pattern.score));
            }
        }

        if !(0.0..=1.0).contains(&rule.deny_list_score) {
            errors.push(format!("Rule '{}': deny_list_score {} is outside [0, 1].", rule.name, rule.deny_list_score));
        }

        if let Some(score) = rule.score_on_valid {
            if !(0.0..=1.0).contains(&score) {
                errors.push(format!("Rule '{}': score_on_valid {} is outside [0, 1].", rule.name, score));
            }
        }

        if let Some(name) = &rule.validator {
            if validators::lookup(name).is_none() {
                errors.push(format!("Rule '{}' references unknown validator '{}'.", rule.name, name));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, regex: &str) -> RecognizerRule {
        RecognizerRule {
            name: name.to_string(),
            entity_type: "TEST".to_string(),
            patterns: vec![PatternDef { name: "p".into(), regex: regex.into(), score: 0.5 }],
            ..Default::default()
        }
    }

    #[test]
    fn opt_in_rules_are_inactive_until_enabled() {
        let mut r = rule("a", "a");
        r.opt_in = true;
        assert!(!r.is_active());
        r.enabled = Some(true);
        assert!(r.is_active());
    }

    #[test]
    fn validation_collects_every_error() {
        let mut bad_score = rule("bad_score", "x");
        bad_score.patterns[0].score = 1.5;
        let mut bad_validator = rule("bad_validator", "x");
        bad_validator.validator = Some("nope".into());
        let config = ScrubConfig {
            rules: vec![rule("dup", "x"), rule("dup", "y"), rule("broken", "(unclosed"), bad_score, bad_validator],
            ..Default::default()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("Duplicate rule name found: 'dup'"));
        assert!(message.contains("invalid regex pattern"));
        assert!(message.contains("outside [0, 1]"));
        assert!(message.contains("unknown validator 'nope'"));
    }

    #[test]
    fn set_active_rules_enables_opt_in_and_drops_disabled() {
        let mut opt_in = rule("itin", "9");
        opt_in.opt_in = true;
        let mut config = ScrubConfig {
            rules: vec![rule("email", "@"), rule("phone", "\\d"), opt_in],
            ..Default::default()
        };
        config.set_active_rules(&["itin".to_string()], &["phone".to_string()]);
        let names: Vec<&str> = config.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["email", "itin"]);
    }
}
