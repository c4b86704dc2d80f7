//! compiler.rs - Manages the compilation and caching of recognizer rules.
//!
//! This module converts `RecognizerRule`s into `CompiledRecognizer`s (regexes,
//! deny-list alternations, context scanners and resolved validators). A global,
//! shared cache keyed by a hash of the active rules avoids redundant compilation.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{anyhow, Result};
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use lazy_static::lazy_static;
use std::sync::{Arc, RwLock};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use piiscrub_context::ContextScanner;

use crate::config::{RecognizerRule, ScrubConfig, MAX_PATTERN_LENGTH};
use crate::errors::ScrubError;
use crate::validators::{self, ValidatorFn};

/// Compiled regexes are capped at 10 MB each.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Distinct rule sets kept compiled at once.
const MAX_CACHED_RULE_SETS: usize = 16;

/// A single compiled pattern and its base score.
#[derive(Debug)]
pub struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
    pub score: f64,
}

/// A recognizer rule ready for matching.
#[derive(Debug)]
pub struct CompiledRecognizer {
    pub name: String,
    pub entity_type: String,
    pub language: String,
    pub patterns: Vec<CompiledPattern>,
    /// Word-bounded alternation of every deny-list term.
    pub deny_list: Option<Regex>,
    pub deny_list_score: f64,
    pub context: ContextScanner,
    pub validator: Option<ValidatorFn>,
    pub score_on_valid: Option<f64>,
}

/// Represents a collection of all compiled recognizers.
#[derive(Debug)]
pub struct CompiledRules {
    pub recognizers: Vec<Arc<CompiledRecognizer>>,
}

lazy_static! {
    /// A thread-safe, global cache for compiled rules.
    /// The key is a hash of the active rules, sorted by name.
    static ref COMPILED_RULES_CACHE: RwLock<HashMap<u64, Arc<CompiledRules>>> = RwLock::new(HashMap::new());
}

/// Hashes the active rules of a config to create a stable cache key.
fn hash_config(config: &ScrubConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut rules_to_hash: Vec<&RecognizerRule> = config.rules.iter().filter(|r| r.is_active()).collect();

    rules_to_hash.sort_by(|a, b| a.name.cmp(&b.name));

    rules_to_hash.hash(&mut hasher);
    hasher.finish()
}

fn build_regex(pattern: &str, rule: &RecognizerRule) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .multi_line(rule.multiline)
        .case_insensitive(rule.case_insensitive)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

fn deny_list_pattern(terms: &[String]) -> Option<String> {
    let mut escaped: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    // Longest first so that overlapping terms prefer the fuller match.
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    escaped.dedup();
    Some(format!(r"\b(?:{})\b", escaped.join("|")))
}

fn compile_rule(rule: RecognizerRule) -> Result<CompiledRecognizer, Vec<ScrubError>> {
    let mut errors = Vec::new();
    let mut patterns = Vec::with_capacity(rule.patterns.len());

    for pattern in &rule.patterns {
        debug!(
            "Attempting to compile recognizer '{}' pattern '{}': {:?}",
            &rule.name, &pattern.name, &pattern.regex
        );
        if pattern.regex.len() > MAX_PATTERN_LENGTH {
            errors.push(ScrubError::PatternLengthExceeded(
                rule.name.clone(),
                pattern.regex.len(),
                MAX_PATTERN_LENGTH,
            ));
            continue;
        }
        match build_regex(&pattern.regex, &rule) {
            Ok(regex) => patterns.push(CompiledPattern {
                name: pattern.name.clone(),
                regex,
                score: pattern.score,
            }),
            Err(e) => errors.push(ScrubError::RuleCompilationError(rule.name.clone(), e)),
        }
    }

    let deny_list = match deny_list_pattern(&rule.deny_list) {
        Some(p) => match build_regex(&p, &rule) {
            Ok(regex) => Some(regex),
            Err(e) => {
                errors.push(ScrubError::RuleCompilationError(rule.name.clone(), e));
                None
            }
        },
        None => None,
    };

    let context = match ContextScanner::new(&rule.context) {
        Ok(scanner) => scanner,
        Err(e) => {
            errors.push(ScrubError::ContextScannerError(rule.name.clone(), e.to_string()));
            ContextScanner::empty()
        }
    };

    let validator = match rule.validator.as_deref() {
        Some(name) => match validators::lookup(name) {
            Some(f) => Some(f),
            None => {
                errors.push(ScrubError::Fatal(format!(
                    "Recognizer '{}' references unknown validator '{}'",
                    rule.name, name
                )));
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    log::debug!(
        target: "piiscrub_core::recognizers",
        "Recognizer '{}' compiled successfully ({} patterns).",
        &rule.name,
        patterns.len()
    );

    Ok(CompiledRecognizer {
        name: rule.name,
        entity_type: rule.entity_type,
        language: rule.language,
        patterns,
        deny_list,
        deny_list_score: rule.deny_list_score,
        context,
        validator,
        score_on_valid: rule.score_on_valid,
    })
}

/// Compiles a list of `RecognizerRule`s into `CompiledRules`.
///
/// Inactive rules are skipped. Every compilation error is collected and
/// reported together.
pub fn compile_rules(rules_to_compile: Vec<RecognizerRule>) -> Result<CompiledRules, ScrubError> {
    debug!("Starting compilation of {} rules.", rules_to_compile.len());

    let mut compiled = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        if !rule.is_active() {
            debug!("Skipping inactive rule '{}'.", rule.name);
            continue;
        }
        if rule.patterns.is_empty() && rule.deny_list.is_empty() {
            warn!("Skipping rule '{}' because it has no patterns or deny_list terms.", &rule.name);
            continue;
        }
        match compile_rule(rule) {
            Ok(c) => compiled.push(Arc::new(c)),
            Err(errs) => compilation_errors.extend(errs),
        }
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors.iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        Err(ScrubError::Fatal(format!("Failed to compile {} rule(s):\n{}", compilation_errors.len(), error_message)))
    } else {
        debug!("Finished compiling rules. Total compiled: {}.", compiled.len());
        Ok(CompiledRules { recognizers: compiled })
    }
}

/// Gets a `CompiledRules` instance from the cache or compiles it if not found.
pub fn get_or_compile_rules(config: &ScrubConfig) -> Result<Arc<CompiledRules>> {
    let cache_key = hash_config(config);

    {
        let cache = COMPILED_RULES_CACHE
            .read()
            .map_err(|_| anyhow!("Compiled rules cache lock is poisoned"))?;
        if let Some(rules) = cache.get(&cache_key) {
            debug!("Serving compiled rules from cache for key: {}", &cache_key);
            return Ok(Arc::clone(rules));
        }
    }

    debug!("Compiled rules not found in cache. Compiling now.");
    let compiled = compile_rules(config.rules.clone())?;
    let compiled_arc = Arc::new(compiled);

    let mut cache = COMPILED_RULES_CACHE
        .write()
        .map_err(|_| anyhow!("Compiled rules cache lock is poisoned"))?;
    insert_bounded(&mut cache, cache_key, Arc::clone(&compiled_arc), MAX_CACHED_RULE_SETS);
    drop(cache);

    debug!("Successfully compiled and cached rules for key: {}", &cache_key);
    Ok(compiled_arc)
}

/// Inserts into the cache, evicting an arbitrary entry once `max` sets are held.
fn insert_bounded(
    cache: &mut HashMap<u64, Arc<CompiledRules>>,
    key: u64,
    rules: Arc<CompiledRules>,
    max: usize,
) {
    if !cache.contains_key(&key) && cache.len() >= max {
        if let Some(evicted) = cache.keys().next().copied() {
            debug!("Compiled rules cache full, evicting key: {}", evicted);
            cache.remove(&evicted);
        }
    }
    cache.insert(key, rules);
}
