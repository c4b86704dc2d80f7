// piiscrub-core/src/lib.rs
//! # piiscrub Core Library
//!
//! `piiscrub-core` finds personally identifiable information (PII) in free text
//! and rewrites it before the text leaves your control, for example before it
//! is sent to an LLM. Detection and rewriting are separate steps, so callers
//! can inspect what was found before deciding how to transform it.
//!
//! ## Modules
//!
//! * `config`: recognizer rules, operators and analysis settings, loaded from YAML.
//! * `validators`: checksum and allocation checks (Luhn, IBAN, SSN, ...).
//! * `recognizer` / `recognizers`: the `Recognizer` trait, compiled pattern
//!   recognizers and the rule-based person name recognizer.
//! * `analyzer`: runs recognizers and resolves overlapping results.
//! * `anonymizer`: applies replace / redact / mask / hash / keep / pseudonymize.
//! * `pseudonymize`: reversible placeholders backed by a mapping store.
//! * `policy`: named, optionally signed anonymization policies.
//! * `suggest`: LLM-assisted discovery of custom recognizers.
//! * `headless`: one-shot helpers, including `sanitize_text`.
//!
//! ## Usage Example
//!
//! ```rust
//! use piiscrub_core::sanitize_text;
//!
//! let out = sanitize_text("My name is John Doe and my phone number is 555-123-4567.")?;
//! assert_eq!(out, "My name is <PERSON> and my phone number is <PHONE_NUMBER>.");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Typed failures (unsupported language, invalid span, missing API key, ...)
//! are `ScrubError` variants. File and configuration boundaries return
//! `anyhow::Error` with context attached.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod analyzer;
pub mod anonymizer;
pub mod config;
pub mod errors;
pub mod headless;
pub mod policy;
pub mod pseudonymize;
pub mod recognizer;
pub mod recognizer_result;
pub mod recognizers;
pub mod suggest;
pub mod validators;

/// Re-exports the configuration types and functions for managing recognizer rules.
pub use config::{
    merge_rules,
    AnalysisSettings,
    PatternDef,
    RecognizerRule,
    ScrubConfig,
    DEFAULT_LANGUAGE,
    DEFAULT_OPERATOR_KEY,
    MAX_PATTERN_LENGTH,
};

pub use errors::ScrubError;

pub use analyzer::{AnalyzeRequest, AnalyzerEngine};
pub use recognizer::Recognizer;
pub use recognizer_result::{redact_sensitive, remove_conflicts, RecognizerResult};
pub use recognizers::compiler::{compile_rules, get_or_compile_rules, CompiledRules};
pub use recognizers::{PatternRecognizer, PersonRecognizer};

pub use anonymizer::{AnonymizerEngine, EngineResult, EntitySummaryItem, HashType, OperatorConfig, OperatorResult};

pub use pseudonymize::{
    EntityMapping,
    FileMappingStore,
    InMemoryMappingStore,
    MappingStore,
    Pseudonymizer,
    DEFAULT_PLACEHOLDER_FORMAT,
    NOT_FOUND,
};

pub use policy::{
    apply_policy_to_config,
    list_available_policies,
    load_policy_by_name,
    policy_candidate_paths,
    sign_policy,
    Policy,
    PolicyRule,
    PolicySummary,
};

pub use suggest::{parse_suggestions, suggestions_to_rules, SuggestClient, SuggestConfig, SuggestedEntity};

pub use headless::{pseudonymize_text, sanitize_text, sanitize_text_with};
